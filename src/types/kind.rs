use std::fmt;

/// The statistics collector variants.
///
/// The upper-case form is the `name` field of serialized snapshots, so a
/// rename here is an output-format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsKind {
    /// Per-rule fire tally plus a run counter.
    ExecutionCount,
    /// Four-level causal activation counters.
    Activation,
    /// Ordered log of fired rule names.
    ExecutionSequence,
    /// Elapsed-time-only baseline.
    Noop,
}

impl StatsKind {
    /// Every variant, in a stable order.
    pub const ALL: [StatsKind; 4] = [
        StatsKind::ExecutionCount,
        StatsKind::Activation,
        StatsKind::ExecutionSequence,
        StatsKind::Noop,
    ];

    /// The upper-case name used in serialized snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatsKind::ExecutionCount => "EXECUTION_COUNT",
            StatsKind::Activation => "ACTIVATION",
            StatsKind::ExecutionSequence => "EXECUTION_SEQUENCE",
            StatsKind::Noop => "NOOP",
        }
    }
}

impl fmt::Display for StatsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_names() {
        assert_eq!(StatsKind::ExecutionCount.to_string(), "EXECUTION_COUNT");
        assert_eq!(StatsKind::Activation.to_string(), "ACTIVATION");
        assert_eq!(
            StatsKind::ExecutionSequence.to_string(),
            "EXECUTION_SEQUENCE"
        );
        assert_eq!(StatsKind::Noop.to_string(), "NOOP");
    }

    #[test]
    fn all_lists_each_variant_once() {
        assert_eq!(StatsKind::ALL.len(), 4);
        for kind in StatsKind::ALL {
            assert_eq!(
                StatsKind::ALL.iter().filter(|k| **k == kind).count(),
                1,
                "{kind} listed more than once"
            );
        }
    }
}
