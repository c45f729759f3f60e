use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{ExtractError, Result};

/// Trait for pluggable value transforms applied by the record mapper.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, value: Value) -> Result<Value>;
}

/// Thread-safe transform registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Transform>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut map: HashMap<&'static str, Arc<dyn Transform>> = HashMap::new();
        map.insert("to_int", Arc::new(builtins::ToInt));
        map.insert("to_float", Arc::new(builtins::ToFloat));
        map.insert("lower", Arc::new(builtins::Lower));
        map.insert("upper", Arc::new(builtins::Upper));
        map.insert("first", Arc::new(builtins::First));
        map.insert("unique", Arc::new(builtins::Unique));
        Self { inner: Arc::new(map) }
    }

    pub fn register<T: Transform + 'static>(&mut self, t: T) {
        let map = Arc::make_mut(&mut self.inner);
        map.insert(t.name(), Arc::new(t));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.inner.get(name).cloned()
    }
}

fn bad_input(name: &'static str, value: &Value) -> ExtractError {
    ExtractError::Transform {
        name: name.to_string(),
        message: format!("cannot convert {value}"),
    }
}

pub mod builtins {
    use super::*;
    use itertools::Itertools;

    /// Parse integers out of strings and integral numbers.
    pub struct ToInt;
    impl Transform for ToInt {
        fn name(&self) -> &'static str {
            "to_int"
        }
        fn apply(&self, value: Value) -> Result<Value> {
            match &value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| bad_input("to_int", &value)),
                _ => Err(bad_input("to_int", &value)),
            }
        }
    }

    pub struct ToFloat;
    impl Transform for ToFloat {
        fn name(&self) -> &'static str {
            "to_float"
        }
        fn apply(&self, value: Value) -> Result<Value> {
            match &value {
                Value::Number(n) => match n.as_f64() {
                    Some(f) => Ok(Value::from(f)),
                    None => Err(bad_input("to_float", &value)),
                },
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::from)
                    .map_err(|_| bad_input("to_float", &value)),
                _ => Err(bad_input("to_float", &value)),
            }
        }
    }

    pub struct Lower;
    impl Transform for Lower {
        fn name(&self) -> &'static str {
            "lower"
        }
        fn apply(&self, value: Value) -> Result<Value> {
            Ok(match value {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other,
            })
        }
    }

    pub struct Upper;
    impl Transform for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn apply(&self, value: Value) -> Result<Value> {
            Ok(match value {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other,
            })
        }
    }

    /// First element of a sequence; null when empty, identity otherwise.
    pub struct First;
    impl Transform for First {
        fn name(&self) -> &'static str {
            "first"
        }
        fn apply(&self, value: Value) -> Result<Value> {
            Ok(match value {
                Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
                other => other,
            })
        }
    }

    /// Deduplicate a sequence, keeping first occurrences; identity otherwise.
    pub struct Unique;
    impl Transform for Unique {
        fn name(&self) -> &'static str {
            "unique"
        }
        fn apply(&self, value: Value) -> Result<Value> {
            Ok(match value {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .unique_by(|v| serde_json::to_string(v).unwrap_or_default())
                        .collect(),
                ),
                other => other,
            })
        }
    }
}
