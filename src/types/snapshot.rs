use chrono::{DateTime, Utc};
use serde::Serialize;

/// Serialized form of one collector.
///
/// Field order is declaration order and is part of the output contract: two
/// runs' snapshots are diffed key-by-key in the first operand's order, so
/// reordering fields here reshapes every downstream diff. Fields a variant
/// does not produce stay `None` and are skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Collector kind name (`EXECUTION_COUNT`, `ACTIVATION`, ...).
    pub name: String,
    /// Identity of the rule-base every contributing session shares.
    pub session_group_id: String,
    /// When the collector was created or last cleared.
    pub last_reset: DateTime<Utc>,
    /// Wall-clock milliseconds since `last_reset`.
    pub elapsed_milliseconds: i64,
    /// Completed runs (or registrations, for one-shot sessions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<u64>,
    /// Catalog rules with no qualifying execution, sorted by qualified name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_executed_rules: Option<Vec<String>>,
    /// Counter tree, one entry per observed rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CounterSnapshot>>,
    /// Total rule firings recorded by the sequence variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_execution_count: Option<u64>,
    /// Fired rule names in fire order (sequence variant only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_sequence: Option<Vec<String>>,
}

impl StatsSnapshot {
    /// Pretty-printed JSON, the on-the-wire form the diff side consumes.
    ///
    /// # Errors
    ///
    /// Returns the underlying serializer error; with this struct that only
    /// happens when the sink layer fails, but callers forward it anyway.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One node of a serialized counter tree.
///
/// The tagged display name carries the level ("(Act)", "(ActBy)", ...);
/// `count` is absent on the fixed Executed/Canceled branch nodes and
/// `children` on leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterSnapshot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CounterSnapshot>>,
}

impl CounterSnapshot {
    /// Counted node with no children (execution tallies, L4 entries).
    pub(crate) fn leaf(name: String, count: u64) -> Self {
        CounterSnapshot {
            name,
            count: Some(count),
            children: None,
        }
    }

    /// Uncounted structural node (the Executed/Canceled branches).
    pub(crate) fn branch(name: String, children: Vec<CounterSnapshot>) -> Self {
        CounterSnapshot {
            name,
            count: None,
            children: Some(children),
        }
    }

    /// Counted node with children (L1 and L2 entries).
    pub(crate) fn with_children(name: String, count: u64, children: Vec<CounterSnapshot>) -> Self {
        CounterSnapshot {
            name,
            count: Some(count),
            children: Some(children),
        }
    }
}
