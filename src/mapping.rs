use std::sync::Arc;

use serde_json::{Map, Value};

use crate::chain::{PathChoice, ProbeHook};
use crate::errors::{ExtractError, Result};
use crate::transforms::{Registry, Transform};

/// A transform attached to a mapping entry: either looked up by name in the
/// mapper's registry when the record is built, or supplied directly.
#[derive(Clone)]
pub enum TransformRef {
    Named(String),
    Func(Arc<dyn Transform>),
}

impl From<&str> for TransformRef {
    fn from(name: &str) -> Self {
        TransformRef::Named(name.to_string())
    }
}

/// What one output key resolves to.
#[derive(Clone)]
pub enum FieldSpec {
    /// Copied through unchanged.
    Literal(Value),
    /// Resolved through a fallback chain.
    Choice(PathChoice),
    /// Resolved through a fallback chain, then transformed.
    Transformed(PathChoice, TransformRef),
    /// A nested record, built recursively.
    Nested(MapSpec),
}

/// An ordered output-record specification. Keys appear in the built record in
/// the order they were declared here.
#[derive(Clone, Default)]
pub struct MapSpec {
    entries: Vec<(String, FieldSpec)>,
}

impl MapSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, spec: FieldSpec) -> Self {
        self.entries.push((key.to_string(), spec));
        self
    }

    pub fn literal(self, key: &str, value: Value) -> Self {
        self.field(key, FieldSpec::Literal(value))
    }

    pub fn choice(self, key: &str, choice: impl Into<PathChoice>) -> Self {
        self.field(key, FieldSpec::Choice(choice.into()))
    }

    pub fn transformed(
        self,
        key: &str,
        choice: impl Into<PathChoice>,
        transform: impl Into<TransformRef>,
    ) -> Self {
        self.field(key, FieldSpec::Transformed(choice.into(), transform.into()))
    }

    pub fn nested(self, key: &str, spec: MapSpec) -> Self {
        self.field(key, FieldSpec::Nested(spec))
    }

    pub fn entries(&self) -> &[(String, FieldSpec)] {
        &self.entries
    }
}

/// Builds output records from a document and a `MapSpec`, driving the
/// fallback-chain resolution and the transform registry.
#[derive(Clone)]
pub struct Mapper {
    registry: Registry,
    probe: Option<ProbeHook>,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    /// Mapper with the builtin transforms registered.
    pub fn new() -> Self {
        Self {
            registry: Registry::with_builtins(),
            probe: None,
        }
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self { registry, probe: None }
    }

    /// Install an observability callback for probe failures.
    pub fn with_probe_hook(mut self, hook: ProbeHook) -> Self {
        self.probe = Some(hook);
        self
    }

    /// Build the record described by `spec` from `doc`.
    ///
    /// `outer_default` is the fallback of last resort for fallback chains
    /// that carry no default of their own. It is scoped to this level only:
    /// nested specifications resolve their defaults independently.
    ///
    /// Fail-fast: the first failing entry aborts the whole call, no partial
    /// record is returned. Transform errors come back exactly as the
    /// transform raised them.
    pub fn map(&self, doc: &Value, spec: &MapSpec, outer_default: Option<&Value>) -> Result<Value> {
        let mut out = Map::with_capacity(spec.entries.len());
        for (key, field) in &spec.entries {
            let value = match field {
                FieldSpec::Literal(v) => v.clone(),
                FieldSpec::Choice(choice) => {
                    self.resolve_choice(doc, key, choice, outer_default, None)?
                }
                FieldSpec::Transformed(choice, transform) => {
                    let transform = self.lookup(transform)?;
                    self.resolve_choice(doc, key, choice, outer_default, Some(&*transform))?
                }
                FieldSpec::Nested(inner) => self.map(doc, inner, None)?,
            };
            out.insert(key.clone(), value);
        }
        Ok(Value::Object(out))
    }

    fn resolve_choice(
        &self,
        doc: &Value,
        key: &str,
        choice: &PathChoice,
        outer_default: Option<&Value>,
        transform: Option<&dyn Transform>,
    ) -> Result<Value> {
        let (resolved, last_failure) =
            choice.resolve_traced(doc, outer_default, self.probe.as_ref());
        match resolved {
            Some(value) => match transform {
                Some(t) => t.apply(value),
                None => Ok(value),
            },
            None => Err(ExtractError::MissingValue {
                key: key.to_string(),
                paths: choice.path_strings(),
                doc: doc.clone(),
                source: last_failure.map(Box::new),
            }),
        }
    }

    fn lookup(&self, transform: &TransformRef) -> Result<Arc<dyn Transform>> {
        match transform {
            TransformRef::Func(t) => Ok(t.clone()),
            TransformRef::Named(name) => self.registry.get(name).ok_or_else(|| {
                ExtractError::Configuration(format!("unknown transform <{name}>"))
            }),
        }
    }
}
