use std::sync::Arc;

use crate::collect::{RuntimeStats, StatsBase};
use crate::engine::{EventSession, RuleCatalog};
use crate::types::{StatsKind, StatsSnapshot};

/// Elapsed-time-only collector: the cheapest variant, useful as a living
/// probe that a group is wired up without paying for any counting.
pub struct NoopStats {
    base: StatsBase,
}

impl NoopStats {
    #[must_use]
    pub fn new(catalog: Arc<dyn RuleCatalog>) -> Self {
        NoopStats {
            base: StatsBase::new(catalog),
        }
    }
}

impl RuntimeStats for NoopStats {
    fn kind(&self) -> StatsKind {
        StatsKind::Noop
    }

    fn attach(self: Arc<Self>, _session: &dyn EventSession) {
        // Nothing to observe, so nothing is attached.
    }

    fn detach(&self, _session: &dyn EventSession) {}

    fn detach_all(&self) {}

    fn clear(&self) {
        self.base.touch();
    }

    fn snapshot(&self) -> StatsSnapshot {
        self.base.snapshot(StatsKind::Noop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::testutil::catalog;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn snapshot_carries_only_header_fields() {
        let stats = NoopStats::new(catalog("kb-noop", &[]));
        let snap = stats.snapshot();
        assert_eq!(snap.name, "NOOP");
        assert_eq!(snap.session_group_id, "kb-noop");
        assert!(snap.elapsed_milliseconds >= 0);
        assert!(snap.execution_count.is_none());
        assert!(snap.children.is_none());
        assert!(snap.rule_sequence.is_none());
    }

    #[test]
    fn clear_restarts_the_reset_clock() {
        let stats = NoopStats::new(catalog("kb-noop", &[]));
        let before = stats.snapshot().last_reset;
        thread::sleep(Duration::from_millis(15));
        stats.clear();
        let snap = stats.snapshot();
        assert!(snap.last_reset > before);
        assert!(snap.elapsed_milliseconds < 10_000);
    }
}
