//! JSON line I/O for the CLI
//!
//! - Input: one JSON value per line, blank lines skipped
//! - Output: one JSON object per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use super::errors::CliResult;
use crate::sanitizer::ValidationError;

/// Reads JSON values line by line. Malformed JSON is an error.
pub fn read_values<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<Value>> {
    input.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(serde_json::from_str::<Value>(&line).map_err(Into::into)),
        Err(e) => Some(Err(e.into())),
    })
}

/// Write a success line
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    write_line(out, &json!({ "status": "ok", "data": data }))
}

/// Write a validation failure line
pub fn write_error<W: Write>(out: &mut W, err: &ValidationError) -> CliResult<()> {
    write_line(
        out,
        &json!({
            "status": "error",
            "code": err.code,
            "http_status": err.status,
            "message": err.message,
        }),
    )
}

/// Write a raw JSON value as one line
pub fn write_line<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_values_skips_blank_lines() {
        let input = "1\n\n  \n{\"a\":2}\n";
        let values: Vec<Value> = read_values(input.as_bytes()).map(|v| v.unwrap()).collect();
        assert_eq!(values, vec![json!(1), json!({"a": 2})]);
    }

    #[test]
    fn test_read_values_rejects_bad_json() {
        let mut values = read_values("{oops\n".as_bytes());
        assert!(values.next().unwrap().is_err());
    }

    #[test]
    fn test_write_lines() {
        let mut out = Vec::new();
        write_response(&mut out, json!(12)).unwrap();
        write_error(&mut out, &ValidationError::new(-1, 400, "Invalid param")).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0], json!({"status": "ok", "data": 12}));
        assert_eq!(
            lines[1],
            json!({"status": "error", "code": -1, "http_status": 400, "message": "Invalid param"})
        );
    }
}
