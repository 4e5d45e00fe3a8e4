//! od-sanitizer - composable sanitization for untrusted request data
//!
//! Parameter contracts (single scalars or whole objects) are declared once
//! from primitives and combinators, then reused at every request boundary.

pub mod cli;
pub mod sanitizer;

pub use sanitizer::{
    ConfigError, ConfigResult, Engine, EngineOptions, ErrorContext, ErrorSpec, Sanitizer,
    SanitizeResult, ValidationError,
};
