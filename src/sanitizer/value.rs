//! JSON value helpers shared by the primitives.

use serde_json::{Number, Value};

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strict equality: numbers compare numerically, other values structurally,
/// different JSON types never match.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_eq(x, y),
        _ => a == b,
    }
}

fn number_eq(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Truthiness of a value, as request-data consumers expect it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Whole-number check; floats with no fractional part count.
pub fn as_integer(value: &Value) -> Option<f64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i as f64);
    }
    if let Some(u) = n.as_u64() {
        return Some(u as f64);
    }
    n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0)
}

/// Base-10 integer parse with prefix semantics: leading whitespace and a
/// sign are accepted, parsing stops at the first non-digit. `None` when no
/// digit could be read.
///
/// Integers outside `i64` are kept as `u64`, then as `f64`.
pub fn parse_int(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.clone()),
        Value::Number(n) => {
            let f = n.as_f64().filter(|f| f.is_finite())?.trunc();
            if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(Number::from(f as i64))
            } else {
                Number::from_f64(f)
            }
        }
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

fn parse_int_prefix(text: &str) -> Option<Number> {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => ("-", &text[1..]),
        Some(b'+') => ("", &text[1..]),
        _ => ("", text),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }

    let literal = format!("{}{}", sign, &digits[..end]);
    if let Ok(i) = literal.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = literal.parse::<u64>() {
        return Some(Number::from(u));
    }
    literal.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Renders a value as text: strings unchanged, scalars in display form,
/// containers as JSON. `None` for null.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_eq_numbers() {
        assert!(strict_eq(&json!(1), &json!(1.0)));
        assert!(!strict_eq(&json!(1), &json!("1")));
        assert!(!strict_eq(&json!(0), &json!(false)));
        assert!(strict_eq(&json!("inf"), &json!("inf")));
    }

    fn int(i: i64) -> Option<Number> {
        Some(Number::from(i))
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int(&json!("12")), int(12));
        assert_eq!(parse_int(&json!("  -123")), int(-123));
        assert_eq!(parse_int(&json!("42abc")), int(42));
        assert_eq!(parse_int(&json!("abc")), None);
        assert_eq!(parse_int(&json!("")), None);
        assert_eq!(parse_int(&json!("-")), None);
        assert_eq!(parse_int(&json!(12.9)), int(12));
        assert_eq!(parse_int(&json!(true)), None);
        assert_eq!(parse_int(&Value::Null), None);
    }

    #[test]
    fn test_parse_int_beyond_i64() {
        assert_eq!(parse_int(&json!(u64::MAX)), Some(Number::from(u64::MAX)));
        assert_eq!(parse_int(&json!("18446744073709551615")), Some(Number::from(u64::MAX)));
        assert_eq!(parse_int(&json!("99999999999999999999")), Number::from_f64(1e20));
        assert_eq!(parse_int(&json!("-99999999999999999999")), Number::from_f64(-1e20));
        assert_eq!(parse_int(&json!(1e20)), Number::from_f64(1e20));
    }

    #[test]
    fn test_as_integer() {
        assert_eq!(as_integer(&json!(3)), Some(3.0));
        assert_eq!(as_integer(&json!(3.0)), Some(3.0));
        assert_eq!(as_integer(&json!(3.5)), None);
        assert_eq!(as_integer(&json!("3")), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!("0")));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(json_type_name(&json!(1)), "int");
        assert_eq!(json_type_name(&json!(1.5)), "float");
        assert_eq!(json_type_name(&json!({})), "object");
    }
}
