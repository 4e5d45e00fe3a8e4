//! Assertion primitive
//!
//! `ensure` turns a failed condition into a `ValidationError` resolved from
//! an `ErrorSpec`. The derived assertions hand back the checked value so they
//! can be used inline.

use serde_json::Value;

use super::errors::{ErrorContext, ErrorSpec, SanitizeResult, ValidationError};
use super::value::strict_eq;

/// Fails with `spec` resolved against `context` unless `condition` holds.
pub fn ensure(condition: bool, spec: &ErrorSpec, context: ErrorContext) -> SanitizeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(fail(spec, &context))
    }
}

/// Unwraps `value`, failing with `spec` when it is absent.
pub fn ensure_some<T>(value: Option<T>, spec: &ErrorSpec, context: ErrorContext) -> SanitizeResult<T> {
    value.ok_or_else(|| fail(spec, &context))
}

/// Unconditional failure.
pub fn fail(spec: &ErrorSpec, context: &ErrorContext) -> ValidationError {
    ValidationError::from_spec(spec, context)
}

/// Requires `value` to be strictly equal to one of `possibles`; returns its index.
pub fn ensure_one_of(
    value: &Value,
    possibles: &[Value],
    spec: &ErrorSpec,
    context: Option<ErrorContext>,
) -> SanitizeResult<usize> {
    let context = context.unwrap_or_else(|| {
        ErrorContext::for_value(value).with_possibles(Value::Array(possibles.to_vec()))
    });
    ensure_some(
        possibles.iter().position(|p| strict_eq(p, value)),
        spec,
        context,
    )
}

/// Requires `value` to be a non-empty string.
pub fn ensure_non_empty_string<'a>(
    value: &'a Value,
    spec: &ErrorSpec,
    context: Option<ErrorContext>,
) -> SanitizeResult<&'a str> {
    let text = value.as_str().filter(|s| !s.is_empty());
    ensure_some(text, spec, context.unwrap_or_else(|| ErrorContext::for_value(value)))
}

/// Requires `value` to be a boolean.
pub fn ensure_bool(value: &Value, spec: &ErrorSpec, context: Option<ErrorContext>) -> SanitizeResult<bool> {
    ensure_some(
        value.as_bool(),
        spec,
        context.unwrap_or_else(|| ErrorContext::for_value(value)),
    )
}
