//! Object schemas
//!
//! A schema is partitioned once, at construction:
//! - direct fields, validated against the matching input property;
//! - `just` fields, whose providers seed the output on every call (they
//!   stay direct too, so an input value still goes through them);
//! - `lazy` fields, removed from the direct set and evaluated last, in
//!   descending priority, against the output assembled so far.
//!
//! Validation order: seed defaults, validate present properties, validate
//! declared-but-missing fields with `null`, evaluate lazy fields, check
//! completeness, apply `after`.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::engine::Engine;
use super::ensure::{ensure, fail};
use super::errors::{ConfigError, ConfigResult, ErrorContext, ErrorSpec, SanitizeResult, ValidationError};
use super::tag::{get_options, is_just_sanitizer, is_lazy_sanitizer, is_sanitizer, tag, Kind, Sanitizer, SanitizerOptions};

const NOT_AN_OBJECT: &str = "Given value is not an object.";
const MISSING_FIELDS: &str = "Missing fields exist.";

/// How field failures surface from an object schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaVersion {
    /// Every field failure becomes the schema's error, annotated with
    /// `parameter=<field>` (version 1)
    #[default]
    Normalize,
    /// Field errors are rethrown unchanged (version 2)
    Propagate,
}

impl SchemaVersion {
    /// Maps the numeric schema version (1 or 2).
    pub fn from_number(version: u8) -> Option<Self> {
        match version {
            1 => Some(SchemaVersion::Normalize),
            2 => Some(SchemaVersion::Propagate),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            SchemaVersion::Normalize => 1,
            SchemaVersion::Propagate => 2,
        }
    }
}

/// Final transformation applied to the assembled output.
pub type AfterFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Options for [`Engine::object`].
#[derive(Clone, Default)]
pub struct ObjectOptions {
    pub version: SchemaVersion,
    /// Fail when a declared field ends up missing from the output
    pub require_all_fields: bool,
    /// Schema-level error; the engine default when `None`
    pub error: Option<ErrorSpec>,
    pub after: Option<AfterFn>,
}

impl ObjectOptions {
    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_require_all_fields(mut self, require: bool) -> Self {
        self.require_all_fields = require;
        self
    }

    pub fn with_error(mut self, error: impl Into<ErrorSpec>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_after<F>(mut self, after: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(after));
        self
    }
}

impl fmt::Debug for ObjectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectOptions")
            .field("version", &self.version)
            .field("require_all_fields", &self.require_all_fields)
            .field("error", &self.error)
            .field("after", &self.after.as_ref().map(|_| ".."))
            .finish()
    }
}

struct LazyField {
    name: String,
    priority: i64,
    mapper: Sanitizer,
}

/// Schema partition computed at construction.
struct ObjectSchema {
    /// Declaration order of direct fields
    keys: Vec<String>,
    direct: BTreeMap<String, Sanitizer>,
    defaults: Vec<(String, Sanitizer)>,
    lazy: Vec<LazyField>,
    version: SchemaVersion,
    require_all_fields: bool,
    error: ErrorSpec,
    after: Option<AfterFn>,
}

impl ObjectSchema {
    fn field_failure(&self, value: &Value, field: &str, err: ValidationError) -> ValidationError {
        trace!(field, code = err.code, "object field failed");
        match self.version {
            SchemaVersion::Propagate => err,
            SchemaVersion::Normalize => {
                let context = ErrorContext::for_value(value)
                    .with_field(field)
                    .with_message(format!("parameter={}", field));
                fail(&self.error, &context)
            }
        }
    }

    fn run(&self, value: &Value) -> SanitizeResult<Value> {
        let input = match value {
            Value::Object(map) => map,
            _ => {
                let context = ErrorContext::for_value(value).with_message(NOT_AN_OBJECT);
                return Err(fail(&self.error, &context));
            }
        };

        let mut converted = Map::new();
        for (name, provider) in &self.defaults {
            converted.insert(name.clone(), provider.run(&Value::Null)?);
        }

        let mut processed = HashSet::new();
        for (name, field_value) in input {
            let Some(sanitizer) = self.direct.get(name) else {
                continue;
            };
            let sanitized = sanitizer
                .run(field_value)
                .map_err(|err| self.field_failure(value, name, err))?;
            converted.insert(name.clone(), sanitized);
            processed.insert(name.as_str());
        }

        for name in &self.keys {
            if processed.contains(name.as_str()) || converted.contains_key(name) {
                continue;
            }
            let Some(sanitizer) = self.direct.get(name) else {
                continue;
            };
            match sanitizer.run(&Value::Null) {
                Ok(sanitized) => {
                    converted.insert(name.clone(), sanitized);
                }
                Err(err) if self.require_all_fields => {
                    return Err(self.field_failure(value, name, err));
                }
                Err(_) => {}
            }
        }

        for field in &self.lazy {
            let computed = field.mapper.run(&Value::Object(converted.clone()))?;
            converted.insert(field.name.clone(), computed);
        }

        if self.require_all_fields {
            let declared = self.keys.len() + self.lazy.len();
            ensure(
                converted.len() == declared,
                &self.error,
                ErrorContext::for_value(value).with_message(MISSING_FIELDS),
            )?;
        }

        let output = Value::Object(converted);
        Ok(match &self.after {
            Some(after) => after(output),
            None => output,
        })
    }
}

impl Engine {
    /// Compiles an object schema from `(field name, sanitizer)` pairs.
    ///
    /// Fails when a field is not a tagged sanitizer or a name is declared
    /// twice. The result is tagged `object` with the direct field names
    /// available through `get_options`.
    pub fn object<K, I>(&self, fields: I, options: ObjectOptions) -> ConfigResult<Sanitizer>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Sanitizer)>,
    {
        let mut keys = Vec::new();
        let mut direct = BTreeMap::new();
        let mut defaults = Vec::new();
        let mut lazy = Vec::new();
        let mut seen = HashSet::new();

        for (name, sanitizer) in fields {
            let name = name.into();
            if !is_sanitizer(&sanitizer) {
                return Err(ConfigError::NotASanitizer {
                    combinator: "object",
                    position: name,
                });
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateField(name));
            }

            if is_lazy_sanitizer(&sanitizer) {
                let priority = match get_options(&sanitizer) {
                    Some(SanitizerOptions::Lazy { priority }) => *priority,
                    _ => super::primitives::DEFAULT_LAZY_PRIORITY,
                };
                lazy.push(LazyField {
                    name,
                    priority,
                    mapper: sanitizer,
                });
                continue;
            }
            if is_just_sanitizer(&sanitizer) {
                defaults.push((name.clone(), sanitizer.clone()));
            }
            keys.push(name.clone());
            direct.insert(name, sanitizer);
        }

        // stable: equal priorities keep declaration order
        lazy.sort_by(|a, b| b.priority.cmp(&a.priority));

        debug!(
            direct = keys.len(),
            defaults = defaults.len(),
            lazy = lazy.len(),
            version = options.version.number(),
            "compiled object schema"
        );

        let tag_keys = keys.clone();
        let schema = ObjectSchema {
            keys,
            direct,
            defaults,
            lazy,
            version: options.version,
            require_all_fields: options.require_all_fields,
            error: self.error_or_default(options.error),
            after: options.after,
        };

        Ok(tag(
            Sanitizer::untagged(move |value| schema.run(value)),
            Kind::Object,
            SanitizerOptions::Object { keys: tag_keys },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitizer::combinators::CombinatorOptions;
    use crate::sanitizer::tag::is_object_sanitizer;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn sum(obj: &Value, fields: &[&str]) -> Value {
        json!(fields.iter().map(|f| obj[*f].as_i64().unwrap_or(0)).sum::<i64>())
    }

    #[test]
    fn test_unspecified_fields_are_dropped() {
        let e = Engine::default();
        let s = e
            .object([("name", e.non_empty_string(None))], ObjectOptions::default())
            .unwrap();
        assert_eq!(s.run(&json!({"name": "hello", "age": 20})).unwrap(), json!({"name": "hello"}));
    }

    #[test]
    fn test_non_object_input() {
        let e = Engine::default();
        let s = e
            .object(
                [("name", e.pass())],
                ObjectOptions::default().with_error(ErrorSpec::from_fn(|ctx| {
                    ctx.message.clone().map(ErrorSpec::Message)
                })),
            )
            .unwrap();
        assert_eq!(s.run(&json!([1])).unwrap_err().message, NOT_AN_OBJECT);
        assert!(s.run(&json!("x")).is_err());
    }

    #[test]
    fn test_lazy_fields_by_priority() {
        let e = Engine::default();
        let s = e
            .object(
                [
                    ("v1", e.parse_int()),
                    ("v2", e.parse_int()),
                    ("sum", e.lazy(|o| sum(o, &["v1", "v2"]), Some(10))),
                    ("sum2", e.lazy(|o| sum(o, &["v1", "v2", "sum"]), Some(5))),
                ],
                ObjectOptions::default(),
            )
            .unwrap();
        assert_eq!(
            s.run(&json!({"v1": 10, "v2": "20"})).unwrap(),
            json!({"v1": 10, "v2": 20, "sum": 30, "sum2": 60})
        );
    }

    #[test]
    fn test_lazy_declaration_order_does_not_matter() {
        let e = Engine::default();
        let s = e
            .object(
                [
                    ("total", e.lazy(|o| sum(o, &["a", "double"]), Some(1))),
                    ("a", e.parse_int()),
                    ("double", e.lazy(|o| sum(o, &["a", "a"]), None)),
                ],
                ObjectOptions::default(),
            )
            .unwrap();
        assert_eq!(
            s.run(&json!({"a": "3"})).unwrap(),
            json!({"a": 3, "double": 6, "total": 9})
        );
    }

    #[test]
    fn test_after() {
        let e = Engine::default();
        let s = e
            .object(
                [
                    ("v1", e.parse_int()),
                    ("v2", e.parse_int()),
                    ("sum", e.lazy(|o| sum(o, &["v1", "v2"]), Some(10))),
                ],
                ObjectOptions::default().with_after(|v| v["sum"].clone()),
            )
            .unwrap();
        assert_eq!(s.run(&json!({"v1": 10, "v2": "20"})).unwrap(), json!(30));
    }

    #[test]
    fn test_require_all_fields() {
        let e = Engine::default();
        let s = e
            .object(
                [("name", e.non_empty_string(None))],
                ObjectOptions::default().with_require_all_fields(true),
            )
            .unwrap();
        assert!(s.run(&json!({"age": 10})).is_err());
        assert_eq!(s.run(&json!({"name": "a"})).unwrap(), json!({"name": "a"}));

        let lenient = e
            .object([("name", e.non_empty_string(None))], ObjectOptions::default())
            .unwrap();
        assert_eq!(lenient.run(&json!({"age": 10})).unwrap(), json!({}));
    }

    #[test]
    fn test_require_all_fields_counts_lazy() {
        let e = Engine::default();
        let s = e
            .object(
                [("a", e.parse_int()), ("b", e.lazy(|o| o["a"].clone(), None))],
                ObjectOptions::default().with_require_all_fields(true),
            )
            .unwrap();
        assert_eq!(s.run(&json!({"a": 1})).unwrap(), json!({"a": 1, "b": 1}));
    }

    #[test]
    fn test_missing_field_filled_by_any_of_just() {
        let e = Engine::default();
        let page = e
            .any_of([e.parse_positive_int(None), e.just(1)], CombinatorOptions::default())
            .unwrap();
        let page_size = e
            .any_of([e.parse_positive_int(None), e.just(10)], CombinatorOptions::default())
            .unwrap();
        let s = e
            .object(
                [("page", page), ("pageSize", page_size)],
                ObjectOptions::default().with_require_all_fields(true),
            )
            .unwrap();
        assert_eq!(s.run(&json!({"page": 5})).unwrap(), json!({"page": 5, "pageSize": 10}));
    }

    #[test]
    fn test_just_provider_runs_every_call() {
        let e = Engine::default();
        let counter = AtomicI64::new(0);
        let s = e
            .object(
                [("counter", e.just_with(move || json!(counter.fetch_add(1, Ordering::SeqCst))))],
                ObjectOptions::default(),
            )
            .unwrap();
        assert_eq!(s.run(&json!({})).unwrap(), json!({"counter": 0}));
        assert_eq!(s.run(&json!({})).unwrap(), json!({"counter": 1}));
        assert_eq!(s.run(&json!({})).unwrap(), json!({"counter": 2}));
    }

    #[test]
    fn test_normalize_annotates_field() {
        let e = Engine::default();
        let s = e
            .object(
                [("id", e.email(ErrorSpec::from("id error.")))],
                ObjectOptions::default().with_error(ErrorSpec::from_fn(|ctx| {
                    Some(ErrorSpec::Message(format!(
                        "{} ({})",
                        ctx.message.clone().unwrap_or_default(),
                        ctx.field.clone().unwrap_or_default()
                    )))
                })),
            )
            .unwrap();
        assert_eq!(s.run(&json!({"id": null})).unwrap_err().message, "parameter=id (id)");
    }

    #[test]
    fn test_propagate_keeps_field_error() {
        let e = Engine::default();
        let s = e
            .object(
                [("id", e.email(ErrorSpec::record("id error.", 1001, 422)))],
                ObjectOptions::default().with_version(SchemaVersion::Propagate),
            )
            .unwrap();
        let err = s.run(&json!({"id": null})).unwrap_err();
        assert_eq!(err.message, "id error.");
        assert_eq!((err.code, err.status), (1001, 422));
    }

    #[test]
    fn test_tagged_with_direct_keys() {
        let e = Engine::default();
        let s = e
            .object(
                [
                    ("a", e.pass()),
                    ("b", e.just(1)),
                    ("c", e.lazy(|_| Value::Null, None)),
                ],
                ObjectOptions::default(),
            )
            .unwrap();
        assert!(is_object_sanitizer(&s));
        assert_eq!(s.signature().unwrap(), "od.sanitizer.object");
        assert_eq!(
            get_options(&s),
            Some(&SanitizerOptions::Object {
                keys: vec!["a".into(), "b".into()]
            })
        );
    }

    #[test]
    fn test_construction_errors() {
        let e = Engine::default();
        let err = e
            .object(
                [("ok", e.pass()), ("bad", Sanitizer::untagged(|v| Ok(v.clone())))],
                ObjectOptions::default(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotASanitizer {
                combinator: "object",
                position: "bad".into()
            }
        );

        let err = e
            .object([("a", e.pass()), ("a", e.pass())], ObjectOptions::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateField("a".into()));
    }

    #[test]
    fn test_schema_version_numbers() {
        assert_eq!(SchemaVersion::from_number(1), Some(SchemaVersion::Normalize));
        assert_eq!(SchemaVersion::from_number(2), Some(SchemaVersion::Propagate));
        assert_eq!(SchemaVersion::from_number(3), None);
        assert_eq!(SchemaVersion::Propagate.number(), 2);
    }
}
