//! Fluent pipeline builder
//!
//! Every method returns a new `Builder` holding the extended step list; the
//! receiver is left untouched, so a prefix can be shared between pipelines.
//! Declaration errors from fallible factories are held until `build`.

use serde_json::Value;

use super::combinators::CombinatorOptions;
use super::engine::Engine;
use super::errors::{ConfigError, ConfigResult, ErrorSpec};
use super::object::ObjectOptions;
use super::primitives::{DateTimeOptions, FileListOptions};
use super::tag::Sanitizer;

#[derive(Debug, Clone)]
pub struct Builder {
    engine: Engine,
    steps: Vec<Sanitizer>,
    error: Option<ConfigError>,
}

impl Builder {
    pub(crate) fn new(engine: Engine) -> Self {
        Self {
            engine,
            steps: Vec::new(),
            error: None,
        }
    }

    fn push(&self, step: Sanitizer) -> Self {
        let mut next = self.clone();
        next.steps.push(step);
        next
    }

    fn push_result(&self, step: ConfigResult<Sanitizer>) -> Self {
        match step {
            Ok(step) => self.push(step),
            Err(e) => {
                let mut next = self.clone();
                next.error.get_or_insert(e);
                next
            }
        }
    }

    /// Appends an already compiled sanitizer.
    pub fn then(&self, step: Sanitizer) -> Self {
        self.push(step)
    }

    /// Appends a step by registered name.
    pub fn step(&self, name: &str) -> Self {
        self.push_result(self.engine.step(name))
    }

    pub fn parse_int(&self) -> Self {
        self.push(self.engine.parse_int())
    }

    pub fn positive_int(&self, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push(self.engine.positive_int(error))
    }

    pub fn parse_positive_int(&self, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push(self.engine.parse_positive_int(error))
    }

    pub fn non_empty_string(&self, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push(self.engine.non_empty_string(error))
    }

    pub fn email(&self, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push(self.engine.email(error))
    }

    pub fn link_string(&self, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push(self.engine.link_string(error))
    }

    pub fn binary_number_to_bool(&self, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push(self.engine.binary_number_to_bool(error))
    }

    pub fn map_exact(
        &self,
        check: impl Into<Value>,
        replacement: impl Into<Value>,
        error: impl Into<Option<ErrorSpec>>,
    ) -> Self {
        self.push(self.engine.map_exact(check, replacement, error))
    }

    pub fn exactly(&self, expected: impl Into<Value>, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push(self.engine.exactly(expected, error))
    }

    pub fn one_of(&self, possibles: Value, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push_result(self.engine.one_of(possibles, error))
    }

    pub fn exists_in_object_values(&self, source: &Value, error: impl Into<Option<ErrorSpec>>) -> Self {
        self.push_result(self.engine.exists_in_object_values(source, error))
    }

    pub fn date_time(&self, options: DateTimeOptions) -> Self {
        self.push(self.engine.date_time(options))
    }

    pub fn file_list(&self, options: FileListOptions) -> Self {
        self.push(self.engine.file_list(options))
    }

    pub fn just(&self, value: impl Into<Value>) -> Self {
        self.push(self.engine.just(value))
    }

    pub fn just_with<F>(&self, provider: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.push(self.engine.just_with(provider))
    }

    /// Appends a lazy mapper. Inside a built chain it runs as a plain
    /// mapping step; priorities only take effect as an object field.
    pub fn lazy<F>(&self, mapper: F, priority: Option<i64>) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.push(self.engine.lazy(mapper, priority))
    }

    pub fn pass(&self) -> Self {
        self.push(self.engine.pass())
    }

    pub fn pass_with<F>(&self, mapper: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.push(self.engine.pass_with(mapper))
    }

    pub fn satisfies<F>(&self, predicate: F, error: impl Into<Option<ErrorSpec>>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.push(self.engine.satisfies(predicate, error))
    }

    pub fn stringify(&self) -> Self {
        self.push(self.engine.stringify())
    }

    pub fn trim(&self) -> Self {
        self.push(self.engine.trim())
    }

    pub fn chain(&self, steps: impl IntoIterator<Item = Sanitizer>, options: CombinatorOptions) -> Self {
        self.push_result(self.engine.chain(steps, options))
    }

    pub fn any_of(&self, alternatives: impl IntoIterator<Item = Sanitizer>, options: CombinatorOptions) -> Self {
        self.push_result(self.engine.any_of(alternatives, options))
    }

    pub fn array(&self, element: Sanitizer, options: CombinatorOptions) -> Self {
        self.push_result(self.engine.array(element, options))
    }

    pub fn object<K, I>(&self, fields: I, options: ObjectOptions) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Sanitizer)>,
    {
        self.push_result(self.engine.object(fields, options))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Compiles the accumulated steps into one chain. `error`, when given,
    /// is the chain's override.
    pub fn build(&self, error: impl Into<Option<ErrorSpec>>) -> ConfigResult<Sanitizer> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        Ok(self.engine.compile_chain(self.steps.clone(), error.into()))
    }
}
