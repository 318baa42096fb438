use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

/// Prefix on values that are equal on both sides.
pub const SAME_HEADER: &str = "= ";
/// Prefix on values that differ.
pub const DIFF_HEADER: &str = "! ";
/// Collapsed form of a sequence that is equal on both sides.
pub const SAME_ARRAY: &str = "= [...]";
/// Collapsed form of a map that is equal on both sides.
pub const SAME_MAP: &str = "= {...}";

/// One node of a comparison tree.
///
/// Scalar outcomes render as annotated strings (`"= x"`, `"! a -> b"`);
/// map and sequence nodes nest. `Serialize` here *is* the output format:
/// the annotated strings land verbatim in the comparison JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffNode {
    /// Scalar equal on both sides.
    Same(Value),
    /// Sequence equal on both sides, collapsed.
    SameArray,
    /// Map equal on both sides, collapsed.
    SameMap,
    /// Differing values; the first operand is always "before".
    Different(Value, Value),
    /// Positionally-aligned element diffs.
    Seq(Vec<DiffNode>),
    /// Per-key diffs in the first operand's key order.
    Map(Vec<(String, DiffNode)>),
}

impl DiffNode {
    /// True when this node and everything under it reports equality.
    #[must_use]
    pub fn is_all_same(&self) -> bool {
        match self {
            DiffNode::Same(_) | DiffNode::SameArray | DiffNode::SameMap => true,
            DiffNode::Different(..) => false,
            DiffNode::Seq(items) => items.iter().all(Self::is_all_same),
            DiffNode::Map(entries) => entries.iter().all(|(_, node)| node.is_all_same()),
        }
    }
}

impl Serialize for DiffNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DiffNode::Same(value) => {
                serializer.serialize_str(&format!("{SAME_HEADER}{}", scalar_text(value)))
            }
            DiffNode::SameArray => serializer.serialize_str(SAME_ARRAY),
            DiffNode::SameMap => serializer.serialize_str(SAME_MAP),
            DiffNode::Different(before, after) => {
                serializer.serialize_str(&render_difference(before, after))
            }
            DiffNode::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DiffNode::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, node) in entries {
                    map.serialize_entry(key, node)?;
                }
                map.end()
            }
        }
    }
}

/// Unquoted text for a scalar; non-scalars fall back to compact JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `"! before -> after"`, with a delta annotation when both sides are
/// numbers. Integer deltas render without decimal noise; anything involving
/// a float uses six-decimal values and one-decimal deltas. The percentage is
/// relative to the first operand.
fn render_difference(before: &Value, after: &Value) -> String {
    if let (Some(a), Some(b)) = (as_integer(before), as_integer(after)) {
        let delta = i128::from(b) - i128::from(a);
        let pct = delta as f64 * 100.0 / a as f64;
        return format!("{DIFF_HEADER}{a} -> {b} ({delta:+}, {pct:+.1}%)");
    }
    if let (Some(a), Some(b)) = (as_float(before), as_float(after)) {
        let delta = b - a;
        let pct = delta * 100.0 / a;
        return format!("{DIFF_HEADER}{a:.6} -> {b:.6} ({delta:+.1}, {pct:+.1}%)");
    }
    format!(
        "{DIFF_HEADER}{} -> {}",
        scalar_text(before),
        scalar_text(after)
    )
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
