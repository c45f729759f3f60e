use std::sync::Arc;

use serde_json::Value;

use crate::errors::ExtractError;
use crate::path::DocPath;

/// Callback invoked when a candidate path in a chain fails structurally.
/// Purely informational; it never alters control flow or results.
pub type ProbeHook = Arc<dyn Fn(&str, &ExtractError) + Send + Sync>;

/// An ordered fallback chain of dotted paths with an optional default.
///
/// `resolve` tries the paths in declared order and the first one that yields
/// any nodes wins. `default: None` means "no default given" and is distinct
/// from an explicit `Some(Value::Null)`.
#[derive(Debug, Clone)]
pub struct PathChoice {
    paths: Vec<DocPath>,
    default: Option<Value>,
}

impl PathChoice {
    /// Chain over the given path strings, tried in order.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths.into_iter().map(|p| DocPath::parse(p.as_ref())).collect(),
            default: None,
        }
    }

    /// Single-path chain.
    pub fn path(path: &str) -> Self {
        Self::new([path])
    }

    /// Set the value used when every path in the chain comes up empty.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Alternation combinator: this chain's paths followed by `other`'s,
    /// order preserved. When both operands carry a default the left one wins.
    pub fn or(mut self, other: PathChoice) -> PathChoice {
        self.paths.extend(other.paths);
        self.default = self.default.or(other.default);
        self
    }

    pub fn paths(&self) -> &[DocPath] {
        &self.paths
    }

    /// The candidate path strings, for diagnostics.
    pub fn path_strings(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// First-match-wins resolution against `doc`.
    ///
    /// Each path is probed with absence permitted. A single surviving node
    /// unwraps to its value; several become a sequence. Structural failures
    /// on a candidate path (say, a `[]` meeting a mapping) do not abort the
    /// chain: they are reported to `probe` and remembered as the cause of a
    /// later missing-value error. When every path comes up empty the chain's
    /// own default applies, then `outer_default`; with neither, `None`.
    pub fn resolve(
        &self,
        doc: &Value,
        outer_default: Option<&Value>,
        probe: Option<&ProbeHook>,
    ) -> Option<Value> {
        let (value, _) = self.resolve_traced(doc, outer_default, probe);
        value
    }

    /// Like `resolve`, but also hands back the last probe failure so the
    /// mapper can chain it into a missing-value error.
    pub(crate) fn resolve_traced(
        &self,
        doc: &Value,
        outer_default: Option<&Value>,
        probe: Option<&ProbeHook>,
    ) -> (Option<Value>, Option<ExtractError>) {
        let mut last_failure = None;
        for path in &self.paths {
            match path.resolve(doc, true) {
                Ok(nodes) if nodes.is_empty() => continue,
                Ok(nodes) => return (Some(unwrap_nodes(nodes)), None),
                Err(err) => {
                    tracing::debug!(path = %path, error = %err, "probe failed");
                    if let Some(hook) = probe {
                        hook(path.as_str(), &err);
                    }
                    last_failure = Some(err);
                }
            }
        }
        let fallback = self.default.clone().or_else(|| outer_default.cloned());
        (fallback, last_failure)
    }
}

impl From<&str> for PathChoice {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

/// One match stays a bare value, several become a sequence.
fn unwrap_nodes(nodes: Vec<&Value>) -> Value {
    if nodes.len() == 1 {
        nodes[0].clone()
    } else {
        Value::Array(nodes.into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn first_matching_path_wins() {
        let doc = json!({"b": {"x": 2}});
        let choice = PathChoice::new(["a.x", "b.x"]);
        assert_eq!(choice.resolve(&doc, None, None), Some(json!(2)));
    }

    #[test]
    fn earlier_path_shadows_later() {
        let doc = json!({"a": {"x": 1}, "b": {"x": 2}});
        let choice = PathChoice::new(["a.x", "b.x"]);
        assert_eq!(choice.resolve(&doc, None, None), Some(json!(1)));
    }

    #[test]
    fn explicit_null_default_is_distinct_from_no_default() {
        let doc = json!({"a": 1});
        let with_null = PathChoice::path("missing").with_default(Value::Null);
        assert_eq!(with_null.resolve(&doc, None, None), Some(Value::Null));

        let without = PathChoice::path("missing");
        assert_eq!(without.resolve(&doc, None, None), None);
    }

    #[test]
    fn outer_default_applies_after_chain_default() {
        let doc = json!({});
        let choice = PathChoice::path("missing");
        let outer = json!("outer");
        assert_eq!(
            choice.resolve(&doc, Some(&outer), None),
            Some(json!("outer"))
        );

        let choice = choice.with_default(json!("own"));
        assert_eq!(
            choice.resolve(&doc, Some(&outer), None),
            Some(json!("own"))
        );
    }

    #[test]
    fn or_concatenates_left_then_right() {
        let combined = PathChoice::path("a.b").or(PathChoice::path("c.d"));
        assert_eq!(combined.path_strings(), vec!["a.b", "c.d"]);

        let doc = json!({"c": {"d": "late"}});
        assert_eq!(combined.resolve(&doc, None, None), Some(json!("late")));
    }

    #[test]
    fn probe_failures_do_not_abort_the_chain() {
        // First path hits a flatten mismatch; second resolves.
        let doc = json!({"a": {"k": 1}, "b": "v"});
        let choice = PathChoice::new(["a.[]", "b"]);

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let hook: ProbeHook = Arc::new(move |path, _err| {
            seen2.lock().unwrap().push(path.to_string());
        });

        let got = choice.resolve(&doc, None, Some(&hook));
        assert_eq!(got, Some(json!("v")));
        assert_eq!(*seen.lock().unwrap(), vec!["a.[]".to_string()]);
    }

    #[test]
    fn multiple_matches_stay_a_sequence() {
        let doc = json!({"a": [{"b": 1}, {"b": 2}]});
        let choice = PathChoice::path("a.[].b");
        assert_eq!(
            choice.resolve(&doc, None, None),
            Some(json!([1, 2]))
        );
    }
}
