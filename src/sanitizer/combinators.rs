//! Sequence, first-success and element-wise composition
//!
//! # Error precedence in `chain`
//!
//! When a step fails the chain raises one error for the whole chain,
//! resolved against the chain's own input:
//! - an explicit override that differs from the engine default wins;
//! - otherwise the failing step's original spec is re-resolved;
//! - a step error with no original spec falls back to the default.

use serde_json::Value;
use tracing::trace;

use super::engine::Engine;
use super::ensure::{ensure, fail};
use super::errors::{ConfigError, ConfigResult, ErrorContext, ErrorSpec, SanitizeResult};
use super::tag::{is_sanitizer, Sanitizer};

/// Options shared by `chain`, `any_of` and `array`.
#[derive(Debug, Clone, Default)]
pub struct CombinatorOptions {
    pub error: Option<ErrorSpec>,
}

impl CombinatorOptions {
    pub fn error(error: impl Into<ErrorSpec>) -> Self {
        Self {
            error: Some(error.into()),
        }
    }
}

/// Compiled sequence of steps.
struct Chain {
    steps: Vec<Sanitizer>,
    error: ErrorSpec,
    error_is_not_default: bool,
}

impl Chain {
    fn run(&self, value: &Value) -> SanitizeResult<Value> {
        let mut current = value.clone();
        for (position, step) in self.steps.iter().enumerate() {
            current = match step.run(&current) {
                Ok(next) => next,
                Err(err) => {
                    trace!(position, code = err.code, "chain step failed");
                    let spec = if self.error_is_not_default {
                        &self.error
                    } else {
                        err.original_spec().unwrap_or(&self.error)
                    };
                    return Err(fail(spec, &ErrorContext::for_value(value)));
                }
            };
        }
        Ok(current)
    }
}

fn require_tagged(combinator: &'static str, sanitizers: &[Sanitizer]) -> ConfigResult<()> {
    match sanitizers.iter().position(|s| !is_sanitizer(s)) {
        Some(position) => Err(ConfigError::NotASanitizer {
            combinator,
            position: position.to_string(),
        }),
        None => Ok(()),
    }
}

impl Engine {
    /// Runs `sanitizers` left to right, feeding each output into the next.
    /// An empty chain is the identity.
    pub fn chain(
        &self,
        sanitizers: impl IntoIterator<Item = Sanitizer>,
        options: CombinatorOptions,
    ) -> ConfigResult<Sanitizer> {
        let steps: Vec<Sanitizer> = sanitizers.into_iter().collect();
        require_tagged("chain", &steps)?;
        Ok(self.compile_chain(steps, options.error))
    }

    pub(crate) fn compile_chain(&self, steps: Vec<Sanitizer>, error: Option<ErrorSpec>) -> Sanitizer {
        if steps.is_empty() {
            return self.pass();
        }
        let default = self.default_error();
        let error_is_not_default = error.as_ref().is_some_and(|e| !e.same_as(default));
        let chain = Chain {
            steps,
            error: self.error_or_default(error),
            error_is_not_default,
        };
        Sanitizer::plain(move |value| chain.run(value))
    }

    /// Returns the first successful result; intermediate failures are
    /// discarded. If every alternative fails the configured error is raised.
    /// An empty `any_of` is the identity.
    pub fn any_of(
        &self,
        sanitizers: impl IntoIterator<Item = Sanitizer>,
        options: CombinatorOptions,
    ) -> ConfigResult<Sanitizer> {
        let alternatives: Vec<Sanitizer> = sanitizers.into_iter().collect();
        require_tagged("anyOf", &alternatives)?;
        if alternatives.is_empty() {
            return Ok(self.pass());
        }

        let error = self.error_or_default(options.error);
        Ok(Sanitizer::plain(move |value| {
            for alternative in &alternatives {
                if let Ok(result) = alternative.run(value) {
                    return Ok(result);
                }
            }
            trace!(alternatives = alternatives.len(), "every anyOf alternative failed");
            Err(fail(&error, &ErrorContext::for_value(value)))
        }))
    }

    /// Maps every element of an array through `element`. A failing element
    /// fails the whole call; no partial result is returned.
    pub fn array(&self, element: Sanitizer, options: CombinatorOptions) -> ConfigResult<Sanitizer> {
        require_tagged("array", std::slice::from_ref(&element))?;
        let error = self.error_or_default(options.error);

        Ok(Sanitizer::plain(move |value| {
            ensure(value.is_array(), &error, ErrorContext::for_value(value))?;
            let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match element.run(item) {
                    Ok(sanitized) => out.push(sanitized),
                    Err(err) => {
                        trace!(index, code = err.code, "array element failed");
                        let context = ErrorContext::for_value(value)
                            .with_index(index)
                            .with_message(format!("Item at index {} failed sanitize.", index));
                        return Err(fail(&error, &context));
                    }
                }
            }
            Ok(Value::Array(out))
        }))
    }
}
