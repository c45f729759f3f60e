use serde_json::Value;
use thiserror::Error;

/// Errors raised by path resolution, fallback chains, and record mapping.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A path segment could not be applied to the node it met: a flatten on a
    /// non-sequence, or a field lookup that failed with absence not permitted.
    #[error("path <{path}> failed at <{segment}> on {}", node_kind(.node))]
    Resolution {
        /// The full original path string.
        path: String,
        /// The segment that failed, as written (`[]` or the field name).
        segment: String,
        /// The node present at failure time.
        node: Value,
        #[source]
        source: Option<Box<ExtractError>>,
    },

    /// A mapping specification is malformed, e.g. it names a transform the
    /// registry does not know.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A fallback chain was exhausted with no default in scope.
    #[error("no value for key <{key}> (tried {paths:?})")]
    MissingValue {
        key: String,
        /// The candidate path strings, in the order they were tried.
        paths: Vec<String>,
        /// Snapshot of the document the chain was resolved against.
        doc: Value,
        #[source]
        source: Option<Box<ExtractError>>,
    },

    /// A transform rejected its input. The mapper propagates this as-is.
    #[error("transform <{name}> failed: {message}")]
    Transform { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;

fn node_kind(node: &Value) -> &'static str {
    match node {
        Value::Object(_) => "a mapping",
        Value::Array(_) => "a sequence",
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
    }
}
