//! Per-rule execution counting.
//!
//! [`ExecutionStats`] keeps one tally per rule that fired plus a run counter
//! for the whole session group. It is the cheapest collector that still
//! answers "which rules ran, how often, and which never ran at all".

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::collect::{detach_group, detach_session, RuntimeStats, StatsBase};
use crate::engine::{EventSession, RuleCatalog, SessionListener};
use crate::types::{ActivationId, CounterNode, CounterSnapshot, RuleId, StatsKind, StatsSnapshot};

/// Prefix for per-rule tally nodes in the snapshot tree.
const EXEC_TAG: &str = "(Exec)";

/// Counts rule firings across every session of one session group.
///
/// One instance serves the whole group: sessions observed concurrently feed
/// the same tallies, so totals are group-wide rather than per session.
pub struct ExecutionStats {
    base: StatsBase,
    /// Root of the tally tree; one child per rule that fired at least once.
    fired: CounterNode,
    runs: AtomicU64,
}

impl ExecutionStats {
    /// Creates an empty collector for the catalog's session group.
    #[must_use]
    pub fn new(catalog: Arc<dyn RuleCatalog>) -> Self {
        Self {
            base: StatsBase::new(catalog),
            fired: CounterNode::new(),
            runs: AtomicU64::new(0),
        }
    }

    /// Number of runs observed since creation or the last [`clear`].
    ///
    /// [`clear`]: RuntimeStats::clear
    #[must_use]
    pub fn execution_count(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// How often `rule` fired; zero when it never did.
    #[must_use]
    pub fn fired_count(&self, rule: &RuleId) -> u64 {
        self.fired.get(rule).map_or(0, |node| node.count())
    }

    pub(crate) fn record_fired(&self, rule: &RuleId) {
        self.fired.child(rule).increment();
    }

    pub(crate) fn record_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Qualified names of catalog rules that never fired, sorted.
    fn not_executed_rules(&self) -> Vec<String> {
        let mut idle = BTreeSet::new();
        for rule in self.base.catalog().rules() {
            if self.fired_count(&rule) == 0 {
                idle.insert(rule.qualified());
            }
        }
        idle.into_iter().collect()
    }
}

impl RuntimeStats for ExecutionStats {
    fn kind(&self) -> StatsKind {
        StatsKind::ExecutionCount
    }

    fn attach(self: Arc<Self>, session: &dyn EventSession) {
        if session.has_listener(StatsKind::ExecutionCount) {
            return;
        }
        let stats = Arc::clone(&self);
        session.attach(Arc::new(ExecutionListener { stats }));
        // Lightweight sessions run exactly once and never signal the start
        // of that run, so the run is counted here.
        if session.is_lightweight() {
            self.record_run();
        }
    }

    fn detach(&self, session: &dyn EventSession) {
        detach_session(StatsKind::ExecutionCount, session);
    }

    fn detach_all(&self) {
        detach_group(StatsKind::ExecutionCount, self.base.catalog().as_ref());
    }

    fn clear(&self) {
        self.runs.store(0, Ordering::Relaxed);
        self.fired.clear();
        self.base.touch();
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut snap = self.base.snapshot(StatsKind::ExecutionCount);
        snap.execution_count = Some(self.execution_count());
        snap.not_executed_rules = Some(self.not_executed_rules());
        snap.children = Some(
            self.fired
                .children()
                .into_iter()
                .map(|(rule, node)| {
                    CounterSnapshot::leaf(format!("{EXEC_TAG}{}", rule.name()), node.count())
                })
                .collect(),
        );
        snap
    }
}

/// Session listener feeding an [`ExecutionStats`] collector.
struct ExecutionListener {
    stats: Arc<ExecutionStats>,
}

impl SessionListener for ExecutionListener {
    fn kind(&self) -> StatsKind {
        StatsKind::ExecutionCount
    }

    fn activation_created(&self, _activation: ActivationId, _rule: &RuleId) {}

    fn activation_cancelled(&self, _activation: ActivationId, _rule: &RuleId) {}

    fn before_fired(&self, _activation: ActivationId, rule: &RuleId) {
        self.stats.record_fired(rule);
    }

    fn run_started(&self) {
        self.stats.record_run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::testutil::catalog;

    #[test]
    fn fires_accumulate_per_rule() {
        let stats = ExecutionStats::new(catalog("kb", &[("p", "a"), ("p", "b")]));
        let ra = RuleId::new("p", "a");
        let rb = RuleId::new("p", "b");

        stats.record_fired(&ra);
        stats.record_fired(&ra);
        stats.record_fired(&ra);
        stats.record_fired(&rb);

        assert_eq!(stats.fired_count(&ra), 3);
        assert_eq!(stats.fired_count(&rb), 1);
        assert_eq!(stats.fired_count(&RuleId::new("p", "c")), 0);
    }

    #[test]
    fn runs_count_independently_of_fires() {
        let stats = ExecutionStats::new(catalog("kb", &[("p", "a")]));
        stats.record_run();
        stats.record_run();
        assert_eq!(stats.execution_count(), 2);
        assert_eq!(stats.fired_count(&RuleId::new("p", "a")), 0);
    }

    #[test]
    fn not_executed_is_sorted_and_qualified() {
        let stats = ExecutionStats::new(catalog("kb", &[("p", "b"), ("p", "a"), ("q", "c")]));
        stats.record_fired(&RuleId::new("q", "c"));

        let snap = stats.snapshot();
        assert_eq!(
            snap.not_executed_rules,
            Some(vec!["p.a".to_owned(), "p.b".to_owned()])
        );
    }

    #[test]
    fn snapshot_labels_rules_with_exec_tag() {
        let stats = ExecutionStats::new(catalog("kb", &[("p", "a")]));
        stats.record_fired(&RuleId::new("p", "a"));
        stats.record_run();

        let snap = stats.snapshot();
        assert_eq!(snap.name, "EXECUTION_COUNT");
        assert_eq!(snap.session_group_id, "kb");
        assert_eq!(snap.execution_count, Some(1));

        let children = snap.children.as_deref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "(Exec)a");
        assert_eq!(children[0].count, Some(1));
    }

    #[test]
    fn clear_drops_all_tallies() {
        let stats = ExecutionStats::new(catalog("kb", &[("p", "a")]));
        let rule = RuleId::new("p", "a");
        stats.record_fired(&rule);
        stats.record_run();

        stats.clear();

        assert_eq!(stats.execution_count(), 0);
        assert_eq!(stats.fired_count(&rule), 0);
        assert!(stats.snapshot().children.as_deref().unwrap().is_empty());
    }

    #[test]
    fn listener_routes_fire_and_run_events() {
        let stats = Arc::new(ExecutionStats::new(catalog("kb", &[("p", "a")])));
        let listener = ExecutionListener {
            stats: Arc::clone(&stats),
        };
        let rule = RuleId::new("p", "a");

        assert_eq!(listener.kind(), StatsKind::ExecutionCount);
        listener.activation_created(ActivationId(1), &rule);
        listener.activation_cancelled(ActivationId(1), &rule);
        assert_eq!(stats.fired_count(&rule), 0);

        listener.before_fired(ActivationId(2), &rule);
        listener.run_started();
        assert_eq!(stats.fired_count(&rule), 1);
        assert_eq!(stats.execution_count(), 1);
    }
}
