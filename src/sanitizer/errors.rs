//! Error types for the sanitizer engine
//!
//! Two kinds of failure exist:
//! - `ValidationError`: raised while a sanitizer runs against a value.
//!   Carries a resolved code/status/message plus the unresolved `ErrorSpec`
//!   it came from, so enclosing combinators can re-resolve it.
//! - `ConfigError`: raised while a schema is being declared. Never caught
//!   internally.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Code used for plain-message error specs.
pub const MESSAGE_CODE: i64 = -1;
/// Status used for plain-message error specs.
pub const MESSAGE_STATUS: u16 = 400;
/// Code used when an error spec carries no usable signature.
pub const INTERNAL_CODE: i64 = -1042;
/// Status used when a resolved spec does not name one.
pub const INTERNAL_STATUS: u16 = 500;

const UNDEFINED_ERROR: &str = "Undefined error";
const INTERNAL_MESSAGE: &str = "Internal error. (No error signature specified)";

/// Callable error spec, evaluated against the failure context.
pub type ErrorFactory = Arc<dyn Fn(&ErrorContext) -> Option<ErrorSpec> + Send + Sync>;

/// Declarative description of the error to raise on failure.
///
/// Resolution is deferred until the failure actually happens, so factories
/// can look at the offending value.
#[derive(Clone)]
pub enum ErrorSpec {
    /// Plain message, resolved with code -1 and status 400.
    Message(String),
    /// Structured record. Missing code/status default to -1/500.
    Record {
        msg: Option<String>,
        code: Option<i64>,
        status: Option<u16>,
    },
    /// Computed from the failure context. Returning `None` yields "Undefined error".
    Factory(ErrorFactory),
    /// No error signature at all; resolves to the internal error.
    Unspecified,
}

impl ErrorSpec {
    /// Plain message spec.
    pub fn message(msg: impl Into<String>) -> Self {
        ErrorSpec::Message(msg.into())
    }

    /// Fully specified record.
    pub fn record(msg: impl Into<String>, code: i64, status: u16) -> Self {
        ErrorSpec::Record {
            msg: Some(msg.into()),
            code: Some(code),
            status: Some(status),
        }
    }

    /// Spec computed from the failure context.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ErrorContext) -> Option<ErrorSpec> + Send + Sync + 'static,
    {
        ErrorSpec::Factory(Arc::new(f))
    }

    /// Message computed from the failure context.
    pub fn message_fn<F>(f: F) -> Self
    where
        F: Fn(&ErrorContext) -> String + Send + Sync + 'static,
    {
        Self::from_fn(move |ctx| Some(ErrorSpec::Message(f(ctx))))
    }

    /// Identity comparison used to tell an explicit override from the
    /// ambient default. Factories compare by pointer.
    pub fn same_as(&self, other: &ErrorSpec) -> bool {
        match (self, other) {
            (ErrorSpec::Message(a), ErrorSpec::Message(b)) => a == b,
            (
                ErrorSpec::Record { msg, code, status },
                ErrorSpec::Record {
                    msg: other_msg,
                    code: other_code,
                    status: other_status,
                },
            ) => msg == other_msg && code == other_code && status == other_status,
            (ErrorSpec::Factory(a), ErrorSpec::Factory(b)) => Arc::ptr_eq(a, b),
            (ErrorSpec::Unspecified, ErrorSpec::Unspecified) => true,
            _ => false,
        }
    }

    /// Resolves this spec into a concrete (message, code, status).
    pub(crate) fn resolve(&self, context: &ErrorContext) -> Resolved {
        match self {
            ErrorSpec::Factory(factory) => match factory(context) {
                Some(ErrorSpec::Factory(_)) | Some(ErrorSpec::Unspecified) => Resolved::internal(),
                Some(spec) => spec.resolve(context),
                None => Resolved::message(UNDEFINED_ERROR),
            },
            ErrorSpec::Message(msg) => Resolved::message(msg),
            ErrorSpec::Record { msg, code, status } => Resolved {
                message: msg.clone().unwrap_or_default(),
                code: code.filter(|c| *c != 0).unwrap_or(MESSAGE_CODE),
                status: status.filter(|s| *s != 0).unwrap_or(INTERNAL_STATUS),
            },
            ErrorSpec::Unspecified => Resolved::internal(),
        }
    }
}

impl fmt::Debug for ErrorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSpec::Message(msg) => f.debug_tuple("Message").field(msg).finish(),
            ErrorSpec::Record { msg, code, status } => f
                .debug_struct("Record")
                .field("msg", msg)
                .field("code", code)
                .field("status", status)
                .finish(),
            ErrorSpec::Factory(_) => write!(f, "Factory(..)"),
            ErrorSpec::Unspecified => write!(f, "Unspecified"),
        }
    }
}

impl From<&str> for ErrorSpec {
    fn from(msg: &str) -> Self {
        ErrorSpec::message(msg)
    }
}

impl From<String> for ErrorSpec {
    fn from(msg: String) -> Self {
        ErrorSpec::Message(msg)
    }
}

/// A resolved error spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub message: String,
    pub code: i64,
    pub status: u16,
}

impl Resolved {
    fn message(msg: &str) -> Self {
        Self {
            message: msg.to_string(),
            code: MESSAGE_CODE,
            status: MESSAGE_STATUS,
        }
    }

    fn internal() -> Self {
        Self {
            message: INTERNAL_MESSAGE.to_string(),
            code: INTERNAL_CODE,
            status: INTERNAL_STATUS,
        }
    }
}

/// Failure context handed to error factories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// The offending value (the whole input for combinators)
    pub value: Option<Value>,
    /// Free-form detail, e.g. `parameter=name`
    pub message: Option<String>,
    /// Object field that failed
    pub field: Option<String>,
    /// Array index that failed
    pub index: Option<usize>,
    /// Accepted values for membership checks
    pub possibles: Option<Value>,
}

impl ErrorContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying the offending value.
    pub fn for_value(value: &Value) -> Self {
        Self {
            value: Some(value.clone()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_possibles(mut self, possibles: Value) -> Self {
        self.possibles = Some(possibles);
        self
    }

    /// The offending value rendered for messages. Strings are shown raw,
    /// a missing value renders as `undefined`.
    pub fn value_text(&self) -> String {
        match &self.value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "undefined".to_string(),
        }
    }
}

/// Structured failure raised by a sanitizer.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Application error code
    pub code: i64,
    /// HTTP status to report
    pub status: u16,
    /// Resolved message
    pub message: String,
    /// Always true for errors raised by the engine
    pub handled: bool,
    original_spec: Option<ErrorSpec>,
}

impl ValidationError {
    /// Builds an error directly, without an originating spec.
    ///
    /// `chain` falls back to the ambient default error for these.
    pub fn new(code: i64, status: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
            handled: true,
            original_spec: None,
        }
    }

    /// Resolves `spec` against `context` and keeps the unresolved spec.
    pub fn from_spec(spec: &ErrorSpec, context: &ErrorContext) -> Self {
        let resolved = spec.resolve(context);
        Self {
            code: resolved.code,
            status: resolved.status,
            message: resolved.message,
            handled: true,
            original_spec: Some(spec.clone()),
        }
    }

    /// The `ErrorSpec` this error was resolved from, if any.
    pub fn original_spec(&self) -> Option<&ErrorSpec> {
        self.original_spec.as_ref()
    }

    /// Whether the status is a 4xx.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Schema-declaration mistakes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid usage of sanitizer.{combinator}, [{position}] is not a sanitizer")]
    NotASanitizer {
        combinator: &'static str,
        position: String,
    },

    #[error("Invalid usage of sanitizer.object, [{0}] is declared more than once")]
    DuplicateField(String),

    #[error("oneOf requires array or object, got {0}")]
    OneOfPossibles(&'static str),

    #[error("existsInObjectValues configuration error: {0} has no values")]
    ObjectValues(&'static str),

    #[error("Unknown sanitizer step: {0}")]
    UnknownStep(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Result of running a sanitizer.
pub type SanitizeResult<T> = Result<T, ValidationError>;

/// Result of declaring a sanitizer.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_spec_resolves_to_client_error() {
        let err = ValidationError::from_spec(&"bad".into(), &ErrorContext::new());
        assert_eq!(err.message, "bad");
        assert_eq!(err.code, MESSAGE_CODE);
        assert_eq!(err.status, MESSAGE_STATUS);
        assert!(err.handled);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_record_defaults_missing_code_and_status() {
        let spec = ErrorSpec::Record {
            msg: Some("nope".into()),
            code: None,
            status: None,
        };
        let err = ValidationError::from_spec(&spec, &ErrorContext::new());
        assert_eq!(err.code, -1);
        assert_eq!(err.status, 500);

        let spec = ErrorSpec::record("taken", 1009, 409);
        let err = ValidationError::from_spec(&spec, &ErrorContext::new());
        assert_eq!((err.code, err.status), (1009, 409));
        assert_eq!(err.to_string(), "taken");
    }

    #[test]
    fn test_factory_sees_context() {
        let spec = ErrorSpec::message_fn(|ctx| format!("Invalid link : {}", ctx.value_text()));
        let err = ValidationError::from_spec(&spec, &ErrorContext::for_value(&json!("htt://x")));
        assert_eq!(err.message, "Invalid link : htt://x");
    }

    #[test]
    fn test_factory_returning_nothing() {
        let spec = ErrorSpec::from_fn(|_| None);
        let err = ValidationError::from_spec(&spec, &ErrorContext::new());
        assert_eq!(err.message, "Undefined error");
        assert_eq!(err.status, 400);
    }

    #[test]
    fn test_unspecified_is_internal() {
        let err = ValidationError::from_spec(&ErrorSpec::Unspecified, &ErrorContext::new());
        assert_eq!(err.code, INTERNAL_CODE);
        assert_eq!(err.status, INTERNAL_STATUS);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_original_spec_is_kept_unresolved() {
        let spec = ErrorSpec::message_fn(|ctx| ctx.value_text());
        let err = ValidationError::from_spec(&spec, &ErrorContext::for_value(&json!(1)));
        assert!(err.original_spec().unwrap().same_as(&spec));
        assert!(ValidationError::new(-1, 400, "x").original_spec().is_none());
    }

    #[test]
    fn test_same_as() {
        let f = ErrorSpec::message_fn(|_| "a".into());
        let g = ErrorSpec::message_fn(|_| "a".into());
        assert!(f.same_as(&f.clone()));
        assert!(!f.same_as(&g));
        assert!(ErrorSpec::from("x").same_as(&ErrorSpec::from("x")));
        assert!(!ErrorSpec::from("x").same_as(&ErrorSpec::Unspecified));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(ErrorContext::for_value(&json!("")).value_text(), "");
        assert_eq!(ErrorContext::for_value(&json!(-123)).value_text(), "-123");
        assert_eq!(ErrorContext::new().value_text(), "undefined");
    }
}
