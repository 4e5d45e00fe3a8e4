//! Sanitizer engine
//!
//! Sanitizers are declared once from primitives and combinators, then run
//! against untrusted values:
//! - `engine`: the `Engine` handle every factory hangs off
//! - `primitives`: leaf validators (`parse_int`, `email`, `one_of`, ...)
//! - `combinators`: `chain`, `any_of`, `array`
//! - `object`: object schemas with `just`/`lazy` fields
//! - `builder`: fluent construction of chains
//! - `config`: JSON engine configuration
//!
//! Declaration mistakes are `ConfigError`s, returned when the sanitizer is
//! built. Runtime failures are `ValidationError`s.

mod builder;
mod combinators;
mod config;
mod datetime;
mod engine;
mod ensure;
mod errors;
mod object;
mod primitives;
mod tag;
mod value;

pub use builder::Builder;
pub use combinators::CombinatorOptions;
pub use config::{EngineConfig, ErrorConfig, DEFAULT_CONFIG_PATH};
pub use datetime::DEFAULT_FORMAT;
pub use engine::{Engine, EngineOptions, DEFAULT_ERROR_MESSAGE, STEP_NAMES};
pub use ensure::{ensure, ensure_bool, ensure_non_empty_string, ensure_one_of, ensure_some, fail};
pub use errors::{
    ConfigError, ConfigResult, ErrorContext, ErrorFactory, ErrorSpec, SanitizeResult, ValidationError,
    INTERNAL_CODE, INTERNAL_STATUS, MESSAGE_CODE, MESSAGE_STATUS,
};
pub use object::{AfterFn, ObjectOptions, SchemaVersion};
pub use primitives::{DateTimeOptions, FileListOptions, DEFAULT_LAZY_PRIORITY};
pub use tag::{
    get_options, is_just_sanitizer, is_lazy_sanitizer, is_object_sanitizer, is_sanitizer, tag, Kind, Sanitizer,
    SanitizerOptions, SIGNATURE,
};
pub use value::{is_truthy, json_type_name, strict_eq};
