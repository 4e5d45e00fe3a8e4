//! CLI command implementations
//!
//! `check` compiles a sanitizer from registered step names, then validates
//! stdin line by line. A failing value produces an error line, not a fatal
//! error; the run continues with the next line.

use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::sanitizer::{Engine, EngineConfig, ObjectOptions, Sanitizer, SchemaVersion, STEP_NAMES};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_values, write_error, write_line, write_response};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "OD_SANITIZE_LOG";

/// Main CLI entry point
///
/// Installs logging, parses arguments and dispatches to the command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    init_logging();
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check {
            config,
            steps,
            field,
            require_all_fields,
            schema_version,
        } => {
            let engine = load_engine(&config)?;
            let sanitizer = compile(&engine, &steps, &field, require_all_fields, schema_version)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            let count = check(&sanitizer, stdin.lock(), &mut stdout.lock())?;
            info!(count, "check finished");
            Ok(())
        }
        Command::Steps => steps(&mut io::stdout().lock()),
    }
}

fn load_engine(config_path: &Path) -> CliResult<Engine> {
    let config = EngineConfig::load(config_path)?;
    debug!(path = %config_path.display(), "loaded engine config");
    Ok(config.into_engine())
}

/// Builds the sanitizer described by `--steps` or `--field`.
pub fn compile(
    engine: &Engine,
    steps: &[String],
    fields: &[String],
    require_all_fields: bool,
    schema_version: u8,
) -> CliResult<Sanitizer> {
    if fields.is_empty() {
        if steps.is_empty() {
            return Err(CliError::schema_error("either --steps or --field is required"));
        }
        return compile_chain(engine, steps.iter().map(String::as_str));
    }

    let version = SchemaVersion::from_number(schema_version)
        .ok_or_else(|| CliError::schema_error(format!("unsupported schema version {}", schema_version)))?;

    let mut declared = Vec::with_capacity(fields.len());
    for field in fields {
        let (name, names) = parse_field(field)?;
        declared.push((name.to_string(), compile_chain(engine, names.split(','))?));
    }

    let options = ObjectOptions::default()
        .with_version(version)
        .with_require_all_fields(require_all_fields);
    Ok(engine.object(declared, options)?)
}

fn compile_chain<'a>(engine: &Engine, names: impl Iterator<Item = &'a str>) -> CliResult<Sanitizer> {
    let builder = names
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .fold(engine.builder(), |builder, name| builder.step(name));
    Ok(builder.build(None)?)
}

fn parse_field(field: &str) -> CliResult<(&str, &str)> {
    match field.split_once('=') {
        Some((name, steps)) if !name.trim().is_empty() => Ok((name.trim(), steps)),
        _ => Err(CliError::schema_error(format!(
            "invalid field '{}', expected NAME=STEP[,STEP...]",
            field
        ))),
    }
}

/// Sanitizes every value read from `input`, writing one result line each.
/// Returns the number of values processed.
pub fn check<R: BufRead, W: Write>(sanitizer: &Sanitizer, input: R, out: &mut W) -> CliResult<usize> {
    let mut count = 0;
    for value in read_values(input) {
        match sanitizer.run(&value?) {
            Ok(data) => write_response(out, data)?,
            Err(err) => {
                debug!(code = err.code, status = err.status, "value rejected");
                write_error(out, &err)?;
            }
        }
        count += 1;
    }
    Ok(count)
}

/// Lists the registered step names as one JSON line.
pub fn steps<W: Write>(out: &mut W) -> CliResult<()> {
    write_line(out, &serde_json::json!({ "status": "ok", "data": STEP_NAMES }))
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    fn run_check(sanitizer: &Sanitizer, input: &str) -> Vec<Value> {
        let mut out = Vec::new();
        check(sanitizer, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_check_step_chain() {
        let engine = Engine::default();
        let s = compile(&engine, &strings(&["parseInt", "positiveInt"]), &[], false, 1).unwrap();
        let lines = run_check(&s, "\"12\"\n\"-123\"\n");
        assert_eq!(lines[0], json!({"status": "ok", "data": 12}));
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[1]["message"], "Invalid param");
        assert_eq!(lines[1]["http_status"], 400);
    }

    #[test]
    fn test_check_object_fields() {
        let engine = Engine::default();
        let fields = strings(&["name=trim,nonEmptyString", "age=parsePositiveInt"]);
        let s = compile(&engine, &[], &fields, true, 1).unwrap();
        let lines = run_check(&s, "{\"name\":\" jay \",\"age\":\"31\"}\n{\"age\":1}\n");
        assert_eq!(lines[0]["data"], json!({"name": "jay", "age": 31}));
        assert_eq!(lines[1]["status"], "error");
    }

    #[test]
    fn test_compile_errors() {
        let engine = Engine::default();
        let err = compile(&engine, &[], &[], false, 1).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);

        let err = compile(&engine, &strings(&["shout"]), &[], false, 1).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);

        let err = compile(&engine, &[], &strings(&["=trim"]), false, 1).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);

        let err = compile(&engine, &[], &strings(&["a=trim", "a=pass"]), false, 1).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
    }

    #[test]
    fn test_load_engine_uses_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("od-sanitize.json");
        fs::write(&config_path, json!({"default_error": "Nope"}).to_string()).unwrap();

        let engine = load_engine(&config_path).unwrap();
        let s = compile(&engine, &strings(&["email"]), &[], false, 1).unwrap();
        let lines = run_check(&s, "\"jay\"\n");
        assert_eq!(lines[0]["message"], "Nope");

        let err = load_engine(&temp_dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_steps_lists_names() {
        let mut out = Vec::new();
        steps(&mut out).unwrap();
        let line: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["data"].as_array().unwrap().len(), STEP_NAMES.len());
    }
}
