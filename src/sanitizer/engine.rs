//! Engine handle
//!
//! Every factory hangs off an `Engine`, which carries the default error and
//! date format explicitly. There is no global configuration.

use std::sync::Arc;

use super::builder::Builder;
use super::datetime::DEFAULT_FORMAT;
use super::errors::{ConfigError, ConfigResult, ErrorSpec};
use super::primitives::{DateTimeOptions, FileListOptions};
use super::tag::Sanitizer;

/// Message of the default error spec.
pub const DEFAULT_ERROR_MESSAGE: &str = "Invalid param";

/// Steps that can be looked up by name. All of them take default options.
pub const STEP_NAMES: &[&str] = &[
    "parseInt",
    "positiveInt",
    "parsePositiveInt",
    "nonEmptyString",
    "email",
    "linkString",
    "binaryNumberToBool",
    "dateTime",
    "fileList",
    "pass",
    "toString",
    "trim",
];

/// Engine-wide settings threaded into every factory.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Error raised when a factory is not given its own
    pub default_error: ErrorSpec,
    /// Format used by `date_time` when none is given (moment-style tokens)
    pub date_format: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_error: ErrorSpec::message(DEFAULT_ERROR_MESSAGE),
            date_format: DEFAULT_FORMAT.to_string(),
        }
    }
}

/// Factory for sanitizers. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: Arc<EngineOptions>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    /// Engine whose default error is `error`.
    pub fn with_default_error(error: impl Into<ErrorSpec>) -> Self {
        Self::new(EngineOptions {
            default_error: error.into(),
            ..EngineOptions::default()
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn default_error(&self) -> &ErrorSpec {
        &self.options.default_error
    }

    pub(crate) fn error_or_default(&self, error: Option<ErrorSpec>) -> ErrorSpec {
        error.unwrap_or_else(|| self.options.default_error.clone())
    }

    /// Fluent pipeline builder.
    pub fn builder(&self) -> Builder {
        Builder::new(self.clone())
    }

    /// Looks up a step by its registered name (see [`STEP_NAMES`]).
    pub fn step(&self, name: &str) -> ConfigResult<Sanitizer> {
        let sanitizer = match name {
            "parseInt" => self.parse_int(),
            "positiveInt" => self.positive_int(None),
            "parsePositiveInt" => self.parse_positive_int(None),
            "nonEmptyString" => self.non_empty_string(None),
            "email" => self.email(None),
            "linkString" => self.link_string(None),
            "binaryNumberToBool" => self.binary_number_to_bool(None),
            "dateTime" => self.date_time(DateTimeOptions::default()),
            "fileList" => self.file_list(FileListOptions::default()),
            "pass" => self.pass(),
            "toString" => self.stringify(),
            "trim" => self.trim(),
            other => return Err(ConfigError::UnknownStep(other.to_string())),
        };
        Ok(sanitizer)
    }
}
