//! A/B execution comparison.
//!
//! [`CompareRunner`] drives one workload through two builds of the same
//! rule catalog and reports what differed: the statistics snapshots of both
//! sides, the facts each side consumed, and the diffs between them. The
//! engine integration stays behind two small traits so the harness never
//! needs to know what a session actually is.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::compare::DiffEngine;
use crate::engine::{EventSession, RuleCatalog};
use crate::registry::StatsRegistry;
use crate::types::StatsKind;

/// Cap on captured facts per side unless overridden.
pub const DEFAULT_MAX_FACTS: usize = 1000;

/// A source of executable sessions for one build of a catalog.
pub trait SessionSource: Send + Sync {
    /// The catalog this source builds sessions for.
    fn catalog(&self) -> Arc<dyn RuleCatalog>;

    /// Spawns a fresh session; the runner uses each one for a single unit.
    fn new_session(&self) -> Arc<dyn EventSession>;

    /// Runs `facts` through the session to completion.
    fn execute(&self, session: &dyn EventSession, facts: &[Value]);
}

/// The facts one measured execution consists of.
pub trait Workload: Send + Sync {
    /// Facts inserted before every unit's batch.
    fn lead_facts(&self) -> Vec<Value> {
        Vec::new()
    }

    /// One fact batch per unit of work.
    fn batches(&self) -> Box<dyn Iterator<Item = Vec<Value>> + Send + '_>;

    /// Facts appended after every unit's batch.
    fn tail_facts(&self) -> Vec<Value> {
        Vec::new()
    }
}

/// Everything [`CompareRunner::compare_execution`] measured, rendered.
///
/// All six fields are JSON documents; the two diffs use the
/// [`DiffEngine`] output format.
#[derive(Debug, Clone)]
pub struct ExecutionComparison {
    /// Snapshot of the base side.
    pub base_stats: String,
    /// Snapshot of the working side.
    pub working_stats: String,
    /// Comparison of the two snapshots, base first.
    pub stats_diff: String,
    /// Facts the base side consumed, capped at the configured maximum.
    pub base_facts: String,
    /// Facts the working side consumed, same cap.
    pub working_facts: String,
    /// Positional comparison of the two fact lists.
    pub facts_diff: String,
}

/// Runs a workload against two session sources and diffs the outcome.
pub struct CompareRunner {
    registry: Arc<StatsRegistry>,
    diff: DiffEngine,
    max_facts: usize,
}

impl CompareRunner {
    /// Creates a runner with the default fact-capture cap.
    #[must_use]
    pub fn new(registry: Arc<StatsRegistry>) -> Self {
        Self::with_max_facts(registry, DEFAULT_MAX_FACTS)
    }

    /// Creates a runner that captures at most `max_facts` facts per side.
    #[must_use]
    pub fn with_max_facts(registry: Arc<StatsRegistry>, max_facts: usize) -> Self {
        Self {
            registry,
            diff: DiffEngine::new(),
            max_facts,
        }
    }

    /// Executes the workload on both sides and reports stats and facts.
    ///
    /// Each unit of the workload runs in a fresh session registered for
    /// `kind`. When both sides are done, every session is unregistered and
    /// every collector cleared, leaving the registry ready for the next
    /// comparison.
    pub fn compare_execution(
        &self,
        base: &dyn SessionSource,
        working: &dyn SessionSource,
        workload: &dyn Workload,
        kind: StatsKind,
    ) -> ExecutionComparison {
        let mut base_inserted = Vec::new();
        let mut working_inserted = Vec::new();
        let base_stats = self.run_side(base, workload, kind, Some(&mut base_inserted), None);
        let working_stats =
            self.run_side(working, workload, kind, Some(&mut working_inserted), None);
        self.registry.unregister_all();
        self.registry.clear_all();

        let stats_diff = self.diff.compare_stats(&base_stats, &working_stats);
        let base_facts = render_facts(&base_inserted);
        let working_facts = render_facts(&working_inserted);
        let facts_diff = self.diff.compare_facts(&base_facts, &working_facts);
        ExecutionComparison {
            base_stats,
            working_stats,
            stats_diff,
            base_facts,
            working_facts,
            facts_diff,
        }
    }

    /// Runs the workload on both sides without measuring anything.
    ///
    /// Intended to let the engine's own just-in-time optimization settle
    /// before a measured comparison. The base side receives half of
    /// `budget`, the working side the rest; the deadline is checked once
    /// per unit, so one long unit can overshoot it.
    pub fn warm_up(
        &self,
        base: &dyn SessionSource,
        working: &dyn SessionSource,
        workload: &dyn Workload,
        kind: StatsKind,
        budget: Duration,
    ) {
        let start = Instant::now();
        self.run_side(base, workload, kind, None, Some(start + budget / 2));
        self.run_side(working, workload, kind, None, Some(start + budget));
        self.registry.unregister_all();
        self.registry.clear_all();
    }

    /// Runs every unit of the workload on one side and snapshots the group.
    fn run_side(
        &self,
        source: &dyn SessionSource,
        workload: &dyn Workload,
        kind: StatsKind,
        mut captured: Option<&mut Vec<Value>>,
        deadline: Option<Instant>,
    ) -> String {
        let catalog = source.catalog();
        let group = catalog.group_id();
        // Leftovers from an earlier run of this group would skew the result.
        self.registry.clear(&group, kind);

        let mut units = 0_u64;
        for batch in workload.batches() {
            if deadline.is_some_and(|at| Instant::now() >= at) {
                break;
            }
            let mut facts = workload.lead_facts();
            facts.extend(batch);
            facts.extend(workload.tail_facts());
            if let Some(sink) = captured.as_deref_mut() {
                for fact in &facts {
                    if sink.len() >= self.max_facts {
                        break;
                    }
                    sink.push(fact.clone());
                }
            }
            let session = source.new_session();
            self.registry.register(session.as_ref(), kind);
            source.execute(session.as_ref(), &facts);
            units += 1;
        }
        if deadline.is_some() {
            tracing::debug!(group = %group, units, "Warm-up side finished");
        }
        self.registry
            .stats_json(&group, kind)
            .unwrap_or_else(|| "{}".to_owned())
    }
}

fn render_facts(facts: &[Value]) -> String {
    match serde_json::to_string_pretty(facts) {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(error = %error, "Failed to render captured facts");
            "{}".to_owned()
        }
    }
}
