//! Dotted-path extraction over nested documents, plus a declarative record
//! mapper built on it.
//!
//! Paths are dot-separated field names with one special token, `[]`, that
//! flattens the sequence at that position into the working set:
//!
//! ```
//! use doc_path_extraction::resolve;
//! use serde_json::json;
//!
//! let doc = json!({"a": [{"b": {"c": ["d", "f"]}}, {"b": {"c": ["g", "h"]}}]});
//! let hits = resolve(&doc, "a.[].b.c", false).unwrap();
//! assert_eq!(hits, vec![&json!(["d", "f"]), &json!(["g", "h"])]);
//! let flat = resolve(&doc, "a.[].b.c.[]", false).unwrap();
//! assert_eq!(flat, vec![&json!("d"), &json!("f"), &json!("g"), &json!("h")]);
//! ```
//!
//! Fallback chains ([`PathChoice`]) try several paths in order with an
//! optional default, and [`MapSpec`] / [`Mapper`] turn a nested specification
//! of chains, literals, and transforms into a normalized output record.

pub mod chain;
pub mod errors;
pub mod mapping;
pub mod path;
pub mod transforms;

use serde_json::Value;

pub use chain::{PathChoice, ProbeHook};
pub use errors::{ExtractError, Result};
pub use mapping::{FieldSpec, MapSpec, Mapper, TransformRef};
pub use path::{DocPath, Segment};
pub use transforms::{Registry, Transform};

/// Resolve a dotted path against `doc`. See [`DocPath::resolve`].
pub fn resolve<'a>(doc: &'a Value, path: &str, allow_empty: bool) -> Result<Vec<&'a Value>> {
    DocPath::parse(path).resolve(doc, allow_empty)
}

/// Build the record described by `spec` with a default [`Mapper`] and no
/// outer default.
pub fn map_record(doc: &Value, spec: &MapSpec) -> Result<Value> {
    Mapper::new().map(doc, spec, None)
}
