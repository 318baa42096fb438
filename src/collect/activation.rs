//! Activation cascade tracking.
//!
//! [`ActivationStats`] records not just that a rule fired but *why* it was
//! put on the agenda and what became of the activation. Every activation is
//! attributed to the rule whose firing most recently preceded it, which makes
//! chains of rule-triggers-rule visible in the snapshot tree:
//!
//! ```text
//! (Act)rule                 how often the rule was activated
//!   (ActBy)cause            ... while `cause` was the last fired rule
//!     Executed
//!       (AfterExec)last     fired, with `last` fired most recently
//!     Canceled
//!       (AfterExec)last     cancelled, with `last` fired most recently
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::collect::{detach_group, detach_session, RuntimeStats, StatsBase};
use crate::engine::{EventSession, RuleCatalog, SessionListener};
use crate::types::{ActivationId, CounterNode, CounterSnapshot, RuleId, StatsKind, StatsSnapshot};

/// Prefix for first-level nodes: the rule an activation belongs to.
const ACT_TAG: &str = "(Act)";
/// Prefix for second-level nodes: the rule that caused the activation.
const ACT_BY_TAG: &str = "(ActBy)";
/// Prefix for leaf nodes: the rule fired most recently at resolution time.
const AFTER_EXEC_TAG: &str = "(AfterExec)";
/// Branch grouping activations that went on to fire.
const EXECUTED_BRANCH: &str = "Executed";
/// Branch grouping activations that were cancelled.
const CANCELED_BRANCH: &str = "Canceled";

fn executed_key() -> &'static RuleId {
    static KEY: OnceLock<RuleId> = OnceLock::new();
    KEY.get_or_init(|| RuleId::branch(EXECUTED_BRANCH))
}

fn canceled_key() -> &'static RuleId {
    static KEY: OnceLock<RuleId> = OnceLock::new();
    KEY.get_or_init(|| RuleId::branch(CANCELED_BRANCH))
}

/// Tracks activation cascades across every session of one session group.
///
/// The tree is four levels deep: rule, causing rule, outcome branch, and the
/// rule fired most recently when the activation was resolved. Counts live on
/// levels one, two and four; the outcome branches only group their leaves.
pub struct ActivationStats {
    base: StatsBase,
    /// L1 roots: one node per rule that was activated at least once.
    activated: CounterNode,
    /// Open activations mapped to the rule that caused them.
    pending: Mutex<HashMap<ActivationId, RuleId>>,
    runs: AtomicU64,
}

impl ActivationStats {
    /// Creates an empty collector for the catalog's session group.
    #[must_use]
    pub fn new(catalog: Arc<dyn RuleCatalog>) -> Self {
        Self {
            base: StatsBase::new(catalog),
            activated: CounterNode::new(),
            pending: Mutex::new(HashMap::new()),
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

    pub(crate) fn record_created(
        &self,
        activation: ActivationId,
        rule: &RuleId,
        caused_by: &RuleId,
    ) {
        let l1 = self.activated.child(rule);
        l1.increment();
        l1.child(caused_by).increment();
        self.pending.lock().insert(activation, caused_by.clone());
    }

    pub(crate) fn record_cancelled(
        &self,
        activation: ActivationId,
        rule: &RuleId,
        last_fired: &RuleId,
    ) {
        self.resolve(activation, rule, last_fired, canceled_key());
    }

    pub(crate) fn record_fired(
        &self,
        activation: ActivationId,
        rule: &RuleId,
        last_fired: &RuleId,
    ) {
        self.resolve(activation, rule, last_fired, executed_key());
    }

    pub(crate) fn record_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Closes an open activation and files it under the outcome branch.
    fn resolve(
        &self,
        activation: ActivationId,
        rule: &RuleId,
        last_fired: &RuleId,
        branch: &RuleId,
    ) {
        let caused_by = match self.pending.lock().remove(&activation) {
            Some(cause) => cause,
            None => {
                tracing::debug!(
                    activation = %activation,
                    rule = %rule,
                    "Ignoring unknown activation"
                );
                return;
            }
        };
        let Some(l1) = self.activated.get(rule) else {
            return;
        };
        let Some(l2) = l1.get(&caused_by) else {
            return;
        };
        // Outcome branches carry no tally of their own.
        l2.child(branch).child(last_fired).increment();
    }

    /// Whether `rule` ever made it past the agenda into a firing.
    ///
    /// Activations that are still open or were cancelled do not count.
    fn rule_executed(&self, rule: &RuleId) -> bool {
        let Some(l1) = self.activated.get(rule) else {
            return false;
        };
        l1.count() > 0
            && l1
                .children()
                .into_iter()
                .any(|(_, l2)| l2.get(executed_key()).is_some_and(|branch| branch.has_children()))
    }

    /// Qualified names of catalog rules that never fired, sorted.
    fn not_executed_rules(&self) -> Vec<String> {
        let mut idle = BTreeSet::new();
        for rule in self.base.catalog().rules() {
            if !self.rule_executed(&rule) {
                idle.insert(rule.qualified());
            }
        }
        idle.into_iter().collect()
    }
}

impl RuntimeStats for ActivationStats {
    fn kind(&self) -> StatsKind {
        StatsKind::Activation
    }

    fn attach(self: Arc<Self>, session: &dyn EventSession) {
        if session.has_listener(StatsKind::Activation) {
            return;
        }
        let stats = Arc::clone(&self);
        session.attach(Arc::new(ActivationListener {
            stats,
            last_fired: Mutex::new(RuleId::root()),
        }));
        if session.is_lightweight() {
            self.record_run();
        }
    }

    fn detach(&self, session: &dyn EventSession) {
        detach_session(StatsKind::Activation, session);
    }

    fn detach_all(&self) {
        detach_group(StatsKind::Activation, self.base.catalog().as_ref());
    }

    fn clear(&self) {
        self.runs.store(0, Ordering::Relaxed);
        self.activated.clear();
        self.pending.lock().clear();
        self.base.touch();
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut snap = self.base.snapshot(StatsKind::Activation);
        snap.execution_count = Some(self.execution_count());
        snap.not_executed_rules = Some(self.not_executed_rules());
        snap.children = Some(
            self.activated
                .children()
                .into_iter()
                .map(|(rule, l1)| activation_snapshot(&rule, &l1))
                .collect(),
        );
        snap
    }
}

fn activation_snapshot(rule: &RuleId, l1: &CounterNode) -> CounterSnapshot {
    let causes = l1
        .children()
        .into_iter()
        .map(|(caused_by, l2)| cause_snapshot(&caused_by, &l2))
        .collect();
    CounterSnapshot::with_children(format!("{ACT_TAG}{}", rule.name()), l1.count(), causes)
}

fn cause_snapshot(caused_by: &RuleId, l2: &CounterNode) -> CounterSnapshot {
    // Both outcome branches show up even when one stayed empty.
    let branches = vec![
        branch_snapshot(EXECUTED_BRANCH, l2.get(executed_key())),
        branch_snapshot(CANCELED_BRANCH, l2.get(canceled_key())),
    ];
    CounterSnapshot::with_children(
        format!("{ACT_BY_TAG}{}", caused_by.name()),
        l2.count(),
        branches,
    )
}

fn branch_snapshot(label: &str, node: Option<Arc<CounterNode>>) -> CounterSnapshot {
    let leaves = node
        .map(|branch| {
            branch
                .children()
                .into_iter()
                .map(|(rule, leaf)| {
                    CounterSnapshot::leaf(format!("{AFTER_EXEC_TAG}{}", rule.name()), leaf.count())
                })
                .collect()
        })
        .unwrap_or_default();
    CounterSnapshot::branch(label.to_owned(), leaves)
}

/// Session listener feeding an [`ActivationStats`] collector.
///
/// Keeps the per-session "last fired rule" state that cause attribution
/// depends on; the shared tree lives in the collector.
struct ActivationListener {
    stats: Arc<ActivationStats>,
    /// Most recently fired rule of this session; the root id before any fire.
    last_fired: Mutex<RuleId>,
}

impl SessionListener for ActivationListener {
    fn kind(&self) -> StatsKind {
        StatsKind::Activation
    }

    fn activation_created(&self, activation: ActivationId, rule: &RuleId) {
        let caused_by = self.last_fired.lock().clone();
        self.stats.record_created(activation, rule, &caused_by);
    }

    fn activation_cancelled(&self, activation: ActivationId, rule: &RuleId) {
        let last = self.last_fired.lock().clone();
        self.stats.record_cancelled(activation, rule, &last);
    }

    fn before_fired(&self, activation: ActivationId, rule: &RuleId) {
        // The lock is held across the record so resolution and the update of
        // `last_fired` happen atomically per session.
        let mut last = self.last_fired.lock();
        self.stats.record_fired(activation, rule, &last);
        *last = rule.clone();
    }

    fn run_started(&self) {
        self.stats.record_run();
    }
}
