//! Sanitizer values and their kind tags
//!
//! A `Sanitizer` is a callable plus immutable metadata. The metadata is what
//! combinators inspect: `object` treats `just` fields as per-call defaults and
//! `lazy` fields as computed fields, and refuses callables carrying no tag.
//!
//! Tag strings have the form `<signature>[.<kind>]`, e.g. `od.sanitizer` for
//! plain sanitizers and `od.sanitizer.object` for object schemas.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::ensure::fail;
use super::errors::{ErrorContext, ErrorSpec, SanitizeResult};

/// Engine signature prefix of every tag string.
pub const SIGNATURE: &str = "od.sanitizer";

type RunFn = Arc<dyn Fn(&Value) -> SanitizeResult<Value> + Send + Sync>;

/// Kind of a tagged sanitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Ordinary validator/transformer
    Plain,
    /// Zero-argument value provider
    Just,
    /// Field computed from the in-progress object output
    Lazy,
    /// Object schema
    Object,
}

impl Kind {
    fn suffix(&self) -> Option<&'static str> {
        match self {
            Kind::Plain => None,
            Kind::Just => Some("just"),
            Kind::Lazy => Some("lazy"),
            Kind::Object => Some("object"),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix().unwrap_or("plain"))
    }
}

/// Kind-specific options attached to a tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SanitizerOptions {
    #[default]
    None,
    /// Evaluation priority of a lazy field; higher runs first
    Lazy { priority: i64 },
    /// Directly validated field names of an object schema
    Object { keys: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    kind: Kind,
    options: SanitizerOptions,
}

/// A compiled validator/transformer.
#[derive(Clone)]
pub struct Sanitizer {
    tag: Option<Tag>,
    run: RunFn,
}

impl Sanitizer {
    /// Wraps a bare callable. It carries no tag, so combinators reject it
    /// until it goes through [`tag`].
    pub fn untagged<F>(f: F) -> Self
    where
        F: Fn(&Value) -> SanitizeResult<Value> + Send + Sync + 'static,
    {
        Self {
            tag: None,
            run: Arc::new(f),
        }
    }

    pub(crate) fn plain<F>(f: F) -> Self
    where
        F: Fn(&Value) -> SanitizeResult<Value> + Send + Sync + 'static,
    {
        tag(Self::untagged(f), Kind::Plain, SanitizerOptions::None)
    }

    /// Runs the sanitizer against `value`.
    pub fn run(&self, value: &Value) -> SanitizeResult<Value> {
        (self.run)(value)
    }

    /// Runs the sanitizer; on failure the override, when given, replaces the
    /// raised error and is resolved against the input value.
    pub fn run_with(&self, value: &Value, error_override: Option<&ErrorSpec>) -> SanitizeResult<Value> {
        match (self.run(value), error_override) {
            (Err(_), Some(spec)) => Err(fail(spec, &ErrorContext::for_value(value))),
            (result, _) => result,
        }
    }

    /// Tag string, `None` when untagged.
    pub fn signature(&self) -> Option<String> {
        let tag = self.tag.as_ref()?;
        Some(match tag.kind.suffix() {
            Some(suffix) => format!("{}.{}", SIGNATURE, suffix),
            None => SIGNATURE.to_string(),
        })
    }

    /// Declared kind, `None` when untagged.
    pub fn kind(&self) -> Option<Kind> {
        self.tag.as_ref().map(|t| t.kind)
    }
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sanitizer")
            .field("signature", &self.signature())
            .field("options", &get_options(self))
            .finish()
    }
}

/// Attaches kind metadata; the callable itself is unchanged.
pub fn tag(sanitizer: Sanitizer, kind: Kind, options: SanitizerOptions) -> Sanitizer {
    Sanitizer {
        tag: Some(Tag { kind, options }),
        run: sanitizer.run,
    }
}

pub fn is_sanitizer(sanitizer: &Sanitizer) -> bool {
    sanitizer.tag.is_some()
}

pub fn is_just_sanitizer(sanitizer: &Sanitizer) -> bool {
    sanitizer.kind() == Some(Kind::Just)
}

pub fn is_lazy_sanitizer(sanitizer: &Sanitizer) -> bool {
    sanitizer.kind() == Some(Kind::Lazy)
}

pub fn is_object_sanitizer(sanitizer: &Sanitizer) -> bool {
    sanitizer.kind() == Some(Kind::Object)
}

/// Options attached by the tag, `None` when untagged.
pub fn get_options(sanitizer: &Sanitizer) -> Option<&SanitizerOptions> {
    sanitizer.tag.as_ref().map(|t| &t.options)
}
