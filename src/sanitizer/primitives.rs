//! Primitive sanitizers
//!
//! Leaf validators. Each checks type/format, raises with its own error
//! (or the engine default) on failure, and otherwise returns the value,
//! possibly transformed.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::datetime;
use super::engine::Engine;
use super::ensure::{ensure, ensure_non_empty_string, ensure_one_of, ensure_some};
use super::errors::{ConfigError, ConfigResult, ErrorContext, ErrorSpec};
use super::tag::{tag, Kind, Sanitizer, SanitizerOptions};
use super::value::{as_integer, is_truthy, json_type_name, parse_int, strict_eq, to_text};

/// Priority of a lazy field when none is given.
pub const DEFAULT_LAZY_PRIORITY: i64 = 10;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}))$"#,
        )
        .expect("email regex must compile")
    })
}

/// Options for [`Engine::date_time`].
#[derive(Debug, Clone, Default)]
pub struct DateTimeOptions {
    /// Moment-style format; the engine's date format when `None`
    pub format: Option<String>,
    pub error: Option<ErrorSpec>,
}

impl DateTimeOptions {
    pub fn format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            error: None,
        }
    }
}

/// Options for [`Engine::file_list`].
#[derive(Debug, Clone, Default)]
pub struct FileListOptions {
    /// Fail on a missing/empty value instead of returning the default
    pub required: bool,
    pub error: Option<ErrorSpec>,
    /// Returned when the value is missing and not required
    pub default_value: Value,
}

impl Engine {
    /// Base-10 integer parse with prefix semantics. Never fails; yields
    /// `null` when no integer could be read.
    pub fn parse_int(&self) -> Sanitizer {
        Sanitizer::plain(|value| Ok(parse_int(value).map_or(Value::Null, Value::Number)))
    }

    /// Requires a whole number >= 0; returns it unchanged.
    pub fn positive_int(&self, error: impl Into<Option<ErrorSpec>>) -> Sanitizer {
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            let n = ensure_some(as_integer(value), &error, ErrorContext::for_value(value))?;
            ensure(n >= 0.0, &error, ErrorContext::for_value(value))?;
            Ok(value.clone())
        })
    }

    /// Requires a non-empty string.
    pub fn non_empty_string(&self, error: impl Into<Option<ErrorSpec>>) -> Sanitizer {
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            ensure_non_empty_string(value, &error, None)?;
            Ok(value.clone())
        })
    }

    /// Requires a string that is a valid address once trimmed; returns it trimmed.
    pub fn email(&self, error: impl Into<Option<ErrorSpec>>) -> Sanitizer {
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            let text = ensure_some(value.as_str(), &error, ErrorContext::for_value(value))?;
            let trimmed = Value::from(text.trim());
            let address = ensure_non_empty_string(&trimmed, &error, Some(ErrorContext::for_value(value)))?;
            ensure(email_re().is_match(address), &error, ErrorContext::for_value(value))?;
            Ok(trimmed)
        })
    }

    /// Requires a string starting with `http` (any case) once trimmed;
    /// returns it trimmed.
    pub fn link_string(&self, error: impl Into<Option<ErrorSpec>>) -> Sanitizer {
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            let text = ensure_some(value.as_str(), &error, ErrorContext::for_value(value))?;
            let link = text.trim();
            ensure(!link.is_empty(), &error, ErrorContext::for_value(value))?;
            ensure(
                link.to_lowercase().starts_with("http"),
                &error,
                ErrorContext::for_value(value),
            )?;
            Ok(Value::from(link))
        })
    }

    /// Parses an integer and maps 0/1 to false/true.
    pub fn binary_number_to_bool(&self, error: impl Into<Option<ErrorSpec>>) -> Sanitizer {
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            let parsed = parse_int(value).map_or(Value::Null, Value::Number);
            let index = ensure_one_of(
                &parsed,
                &[Value::from(0), Value::from(1)],
                &error,
                Some(ErrorContext::for_value(value)),
            )?;
            Ok(Value::Bool(index == 1))
        })
    }

    /// Requires the value to equal `check`; returns `replacement`.
    pub fn map_exact(
        &self,
        check: impl Into<Value>,
        replacement: impl Into<Value>,
        error: impl Into<Option<ErrorSpec>>,
    ) -> Sanitizer {
        let (check, replacement) = (check.into(), replacement.into());
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            ensure(strict_eq(value, &check), &error, ErrorContext::for_value(value))?;
            Ok(replacement.clone())
        })
    }

    /// Requires the value to equal `expected`; returns it unchanged.
    pub fn exactly(&self, expected: impl Into<Value>, error: impl Into<Option<ErrorSpec>>) -> Sanitizer {
        let expected = expected.into();
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            ensure(strict_eq(value, &expected), &error, ErrorContext::for_value(value))?;
            Ok(value.clone())
        })
    }

    /// Membership check.
    ///
    /// With an array the matched element is returned; with an object the
    /// value must be one of its keys and the mapped value is returned.
    pub fn one_of(&self, possibles: Value, error: impl Into<Option<ErrorSpec>>) -> ConfigResult<Sanitizer> {
        let error = self.error_or_default(error.into());
        let (candidates, mapped): (Vec<Value>, Vec<Value>) = match &possibles {
            Value::Array(items) => (items.clone(), items.clone()),
            Value::Object(map) => (
                map.keys().cloned().map(Value::String).collect(),
                map.values().cloned().collect(),
            ),
            other => return Err(ConfigError::OneOfPossibles(json_type_name(other))),
        };

        Ok(Sanitizer::plain(move |value| {
            let context = ErrorContext::for_value(value).with_possibles(possibles.clone());
            let index = ensure_one_of(value, &candidates, &error, Some(context))?;
            Ok(mapped[index].clone())
        }))
    }

    /// Requires the value to be one of `source`'s values (object values or
    /// array elements); returns it unchanged.
    pub fn exists_in_object_values(
        &self,
        source: &Value,
        error: impl Into<Option<ErrorSpec>>,
    ) -> ConfigResult<Sanitizer> {
        let values: Vec<Value> = match source {
            Value::Object(map) => map.values().cloned().collect(),
            Value::Array(items) => items.clone(),
            other => return Err(ConfigError::ObjectValues(json_type_name(other))),
        };
        let error = self.error_or_default(error.into());
        Ok(Sanitizer::plain(move |value| {
            ensure_one_of(value, &values, &error, Some(ErrorContext::for_value(value)))?;
            Ok(value.clone())
        }))
    }

    /// Parses a date-like value (string in the format, RFC 3339 string, or
    /// epoch milliseconds) and renders it in the format.
    pub fn date_time(&self, options: DateTimeOptions) -> Sanitizer {
        let format = options
            .format
            .unwrap_or_else(|| self.options().date_format.clone());
        let strftime = datetime::to_strftime(&format);
        let error = self.error_or_default(options.error);
        Sanitizer::plain(move |value| {
            let parsed = ensure_some(
                datetime::parse(value, &strftime),
                &error,
                ErrorContext::for_value(value),
            )?;
            Ok(Value::from(parsed.format(&strftime).to_string()))
        })
    }

    /// File-list-like input: returns the first element, or the default value
    /// when the input is missing and not required.
    pub fn file_list(&self, options: FileListOptions) -> Sanitizer {
        let FileListOptions {
            required,
            error,
            default_value,
        } = options;
        let error = self.error_or_default(error);
        Sanitizer::plain(move |value| {
            if !is_truthy(value) {
                ensure(!required, &error, ErrorContext::for_value(value))?;
                return Ok(default_value.clone());
            }
            let first = match value {
                Value::Array(items) => items.first(),
                Value::Object(map) => map.get("0"),
                _ => None,
            };
            let first = ensure_some(first.filter(|f| is_truthy(f)), &error, ErrorContext::for_value(value))?;
            Ok(first.clone())
        })
    }

    /// Fixed value, ignoring the input.
    pub fn just(&self, value: impl Into<Value>) -> Sanitizer {
        let value = value.into();
        tag(
            Sanitizer::untagged(move |_| Ok(value.clone())),
            Kind::Just,
            SanitizerOptions::None,
        )
    }

    /// Value produced by `provider` on every call. Provider state (e.g. a
    /// counter) persists across calls and is not synchronized by the engine.
    pub fn just_with<F>(&self, provider: F) -> Sanitizer
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        tag(
            Sanitizer::untagged(move |_| Ok(provider())),
            Kind::Just,
            SanitizerOptions::None,
        )
    }

    /// Identity.
    pub fn pass(&self) -> Sanitizer {
        Sanitizer::plain(|value| Ok(value.clone()))
    }

    /// Infallible mapping.
    pub fn pass_with<F>(&self, mapper: F) -> Sanitizer
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Sanitizer::plain(move |value| Ok(mapper(value)))
    }

    /// Passes the value through when `predicate` holds.
    pub fn satisfies<F>(&self, predicate: F, error: impl Into<Option<ErrorSpec>>) -> Sanitizer
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let error = self.error_or_default(error.into());
        Sanitizer::plain(move |value| {
            ensure(predicate(value), &error, ErrorContext::for_value(value))?;
            Ok(value.clone())
        })
    }

    /// Renders the value as a string; fails on null.
    pub fn stringify(&self) -> Sanitizer {
        let error = self.default_error().clone();
        Sanitizer::plain(move |value| {
            let text = ensure_some(to_text(value), &error, ErrorContext::for_value(value))?;
            Ok(Value::String(text))
        })
    }

    /// `stringify`, then trims surrounding whitespace.
    pub fn trim(&self) -> Sanitizer {
        let error = self.default_error().clone();
        Sanitizer::plain(move |value| {
            let text = ensure_some(to_text(value), &error, ErrorContext::for_value(value))?;
            Ok(Value::from(text.trim()))
        })
    }

    /// Object-only computed field, evaluated from the output assembled so
    /// far. Higher priority runs first; `None` means 10.
    pub fn lazy<F>(&self, mapper: F, priority: Option<i64>) -> Sanitizer
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let priority = priority.unwrap_or(DEFAULT_LAZY_PRIORITY);
        tag(
            Sanitizer::untagged(move |value| Ok(mapper(value))),
            Kind::Lazy,
            SanitizerOptions::Lazy { priority },
        )
    }

    /// `parse_int` then `positive_int`, as one chain whose error is `error`
    /// or the engine default.
    pub fn parse_positive_int(&self, error: impl Into<Option<ErrorSpec>>) -> Sanitizer {
        let error = self.error_or_default(error.into());
        self.compile_chain(vec![self.parse_int(), self.positive_int(None)], Some(error))
    }
}
