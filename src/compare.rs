//! Recursive comparison of rendered snapshots.
//!
//! [`DiffEngine`] takes two JSON documents and produces a third whose shape
//! follows the first operand: every scalar becomes an annotated string
//! (`"= 3"`, `"! 3 -> 5 (+2, +66.7%)"`), equal containers collapse to
//! sentinels, and differing containers are walked recursively. Keys that
//! only the second operand has are not reported; the first operand is the
//! baseline and the output answers "what changed relative to it".

use serde_json::{Map, Value};

use crate::types::{DiffNode, SAME_ARRAY, SAME_MAP};

/// Snapshot key whose entries are compared positionally, never recursively.
const NOT_EXECUTED_KEY: &str = "notExecutedRules";
/// Returned whenever an input does not parse as the expected JSON shape.
const EMPTY_RESULT: &str = "{}";

/// Compares rendered statistics snapshots and fact lists.
///
/// The engine is stateless; one instance can serve any number of
/// comparisons.
///
/// # Example
///
/// ```
/// use ruletally::DiffEngine;
///
/// let diff = DiffEngine::new();
/// let report = diff.compare_stats(
///     r#"{"executionCount": 3}"#,
///     r#"{"executionCount": 5}"#,
/// );
/// assert!(report.contains("! 3 -> 5 (+2, +66.7%)"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    /// Creates a diff engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compares two rendered snapshots, returning the comparison as pretty
    /// JSON.
    ///
    /// Both inputs must be JSON objects, as produced by
    /// [`StatsRegistry::stats_json`](crate::StatsRegistry::stats_json);
    /// anything else yields `"{}"`. The walk visits the first snapshot's
    /// keys in order. A key the second snapshot lacks is compared against
    /// `null`. The `notExecutedRules` list collapses to [`SAME_ARRAY`] when
    /// equal and is otherwise compared entry by entry.
    #[must_use]
    pub fn compare_stats(&self, first: &str, second: &str) -> String {
        let (Some(a), Some(b)) = (parse_map(first), parse_map(second)) else {
            return EMPTY_RESULT.to_owned();
        };
        render(&self.stats_diff(&a, &b))
    }

    /// Compares two rendered fact lists positionally, returning pretty JSON.
    ///
    /// Both inputs must be JSON arrays; anything else yields `"{}"`. The
    /// shorter list is padded with `null`, so leftovers on either side show
    /// up as differences.
    #[must_use]
    pub fn compare_facts(&self, first: &str, second: &str) -> String {
        let (Some(a), Some(b)) = (parse_list(first), parse_list(second)) else {
            return EMPTY_RESULT.to_owned();
        };
        render(&self.seq_diff(&a, &b))
    }

    /// Structured comparison of two JSON values.
    ///
    /// Equal values collapse: scalars to [`DiffNode::Same`], sequences to
    /// [`SAME_ARRAY`], maps to [`SAME_MAP`]. Unequal containers of the same
    /// shape recurse; everything else is a scalar difference.
    #[must_use]
    pub fn compare_values(&self, a: &Value, b: &Value) -> DiffNode {
        if a == b {
            return match a {
                Value::Array(_) => DiffNode::SameArray,
                Value::Object(_) => DiffNode::SameMap,
                _ => DiffNode::Same(a.clone()),
            };
        }
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => self.map_diff(x, y),
            (Value::Array(x), Value::Array(y)) => self.seq_diff(x, y),
            _ => DiffNode::Different(a.clone(), b.clone()),
        }
    }

    fn stats_diff(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> DiffNode {
        let mut entries = Vec::with_capacity(a.len());
        for (key, left) in a {
            let right = b.get(key).cloned().unwrap_or(Value::Null);
            let node = if key == NOT_EXECUTED_KEY {
                rule_list_diff(left, &right)
            } else {
                self.compare_values(left, &right)
            };
            entries.push((key.clone(), node));
        }
        DiffNode::Map(entries)
    }

    fn map_diff(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> DiffNode {
        let entries = a
            .iter()
            .map(|(key, left)| {
                let right = b.get(key).cloned().unwrap_or(Value::Null);
                (key.clone(), self.compare_values(left, &right))
            })
            .collect();
        DiffNode::Map(entries)
    }

    fn seq_diff(&self, a: &[Value], b: &[Value]) -> DiffNode {
        let len = a.len().max(b.len());
        let nodes = (0..len)
            .map(|i| {
                let left = a.get(i).cloned().unwrap_or(Value::Null);
                let right = b.get(i).cloned().unwrap_or(Value::Null);
                self.compare_values(&left, &right)
            })
            .collect();
        DiffNode::Seq(nodes)
    }
}

/// Rule-name lists are flat; entries either match or they don't.
fn rule_list_diff(a: &Value, b: &Value) -> DiffNode {
    if a == b {
        return DiffNode::SameArray;
    }
    let empty = Vec::new();
    let left = a.as_array().unwrap_or(&empty);
    let right = b.as_array().unwrap_or(&empty);
    let len = left.len().max(right.len());
    let nodes = (0..len)
        .map(|i| {
            let l = left.get(i).cloned().unwrap_or(Value::Null);
            let r = right.get(i).cloned().unwrap_or(Value::Null);
            if l == r {
                DiffNode::Same(l)
            } else {
                DiffNode::Different(l, r)
            }
        })
        .collect();
    DiffNode::Seq(nodes)
}

fn parse_map(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(map) => Some(map),
        Err(error) => {
            tracing::warn!(error = %error, "Snapshot input is not a JSON object");
            None
        }
    }
}

fn parse_list(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(text) {
        Ok(list) => Some(list),
        Err(error) => {
            tracing::warn!(error = %error, "Facts input is not a JSON array");
            None
        }
    }
}

fn render(node: &DiffNode) -> String {
    match serde_json::to_string_pretty(node) {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(error = %error, "Failed to render comparison");
            EMPTY_RESULT.to_owned()
        }
    }
}
