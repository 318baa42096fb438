//! Collector registry and lifecycle.
//!
//! A [`StatsRegistry`] owns one collector per `(session group, kind)` pair
//! and hands sessions to them. Collectors are created the first time a
//! session of their group registers and live until the registry is dropped;
//! unregistering only detaches listeners, it never discards recorded data.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::collect::{ActivationStats, ExecutionStats, NoopStats, RuntimeStats, SequenceStats};
use crate::engine::{EventSession, RuleCatalog};
use crate::error::StatsError;
use crate::types::{StatsKind, StatsSnapshot};

/// Registry of statistics collectors, keyed by session group and kind.
///
/// All operations aimed at a group or kind that was never registered are
/// silent no-ops, so callers can tear down instrumentation without tracking
/// what exactly was set up.
#[derive(Default)]
pub struct StatsRegistry {
    groups: RwLock<HashMap<String, HashMap<StatsKind, Arc<dyn RuntimeStats>>>>,
}

impl StatsRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts collecting `kind` statistics for `session`.
    ///
    /// The group's collector is created on first use; registering a session
    /// that already carries a listener of this kind changes nothing.
    pub fn register(&self, session: &dyn EventSession, kind: StatsKind) {
        let collector = self.collector_for(session.catalog(), kind);
        collector.attach(session);
    }

    /// Detaches the `kind` listener from `session`, keeping recorded data.
    pub fn unregister(&self, session: &dyn EventSession, kind: StatsKind) {
        if let Some(collector) = self.lookup(&session.catalog().group_id(), kind) {
            collector.detach(session);
        }
    }

    /// Detaches every collector from every session it watches.
    pub fn unregister_all(&self) {
        for collector in self.collectors() {
            collector.detach_all();
        }
    }

    /// Detaches all collectors of `kind` from their sessions.
    pub fn unregister_all_kind(&self, kind: StatsKind) {
        for collector in self.collectors_of(kind) {
            collector.detach_all();
        }
    }

    /// Resets the `(group, kind)` collector to its initial state.
    pub fn clear(&self, group: &str, kind: StatsKind) {
        if let Some(collector) = self.lookup(group, kind) {
            collector.clear();
        }
    }

    /// Resets every collector in the registry.
    pub fn clear_all(&self) {
        for collector in self.collectors() {
            collector.clear();
        }
    }

    /// Resets all collectors of `kind`.
    pub fn clear_all_kind(&self, kind: StatsKind) {
        for collector in self.collectors_of(kind) {
            collector.clear();
        }
    }

    /// Resets all collectors of the session group.
    pub fn clear_all_group(&self, group: &str) {
        let found: Vec<Arc<dyn RuntimeStats>> = self
            .groups
            .read()
            .get(group)
            .map(|kinds| kinds.values().map(Arc::clone).collect())
            .unwrap_or_default();
        for collector in found {
            collector.clear();
        }
    }

    /// Current snapshot of the `(group, kind)` collector, if one exists.
    #[must_use]
    pub fn snapshot(&self, group: &str, kind: StatsKind) -> Option<StatsSnapshot> {
        self.lookup(group, kind).map(|collector| collector.snapshot())
    }

    /// Current snapshot rendered as pretty JSON, if the collector exists.
    #[must_use]
    pub fn stats_json(&self, group: &str, kind: StatsKind) -> Option<String> {
        let snap = self.snapshot(group, kind)?;
        match snap.to_json() {
            Ok(json) => Some(json),
            Err(error) => {
                tracing::warn!(group, kind = %kind, error = %error, "Failed to serialize snapshot");
                None
            }
        }
    }

    /// Writes the `(group, kind)` snapshot to `sink` as pretty JSON.
    ///
    /// Writing for a group or kind that was never registered is a no-op.
    pub fn write_stats(
        &self,
        sink: &mut dyn Write,
        group: &str,
        kind: StatsKind,
    ) -> Result<(), StatsError> {
        let Some(snap) = self.snapshot(group, kind) else {
            return Ok(());
        };
        let rendered = serde_json::to_vec_pretty(&snap)?;
        sink.write_all(&rendered)?;
        Ok(())
    }

    /// Returns the group's collector of `kind`, creating it on first use.
    fn collector_for(
        &self,
        catalog: Arc<dyn RuleCatalog>,
        kind: StatsKind,
    ) -> Arc<dyn RuntimeStats> {
        let group = catalog.group_id();
        if let Some(found) = self
            .groups
            .read()
            .get(&group)
            .and_then(|kinds| kinds.get(&kind))
        {
            return Arc::clone(found);
        }
        let mut groups = self.groups.write();
        let kinds = groups.entry(group.clone()).or_default();
        // Re-checked under the write lock; another session of the group may
        // have won the race.
        if let Some(found) = kinds.get(&kind) {
            return Arc::clone(found);
        }
        tracing::debug!(group = %group, kind = %kind, "Creating statistics collector");
        let collector = new_collector(catalog, kind);
        kinds.insert(kind, Arc::clone(&collector));
        collector
    }

    fn lookup(&self, group: &str, kind: StatsKind) -> Option<Arc<dyn RuntimeStats>> {
        self.groups
            .read()
            .get(group)
            .and_then(|kinds| kinds.get(&kind))
            .map(Arc::clone)
    }

    /// Every collector, collected first so no registry lock is held while
    /// sessions are touched.
    fn collectors(&self) -> Vec<Arc<dyn RuntimeStats>> {
        self.groups
            .read()
            .values()
            .flat_map(|kinds| kinds.values().map(Arc::clone))
            .collect()
    }

    fn collectors_of(&self, kind: StatsKind) -> Vec<Arc<dyn RuntimeStats>> {
        self.groups
            .read()
            .values()
            .filter_map(|kinds| kinds.get(&kind).map(Arc::clone))
            .collect()
    }
}

fn new_collector(catalog: Arc<dyn RuleCatalog>, kind: StatsKind) -> Arc<dyn RuntimeStats> {
    match kind {
        StatsKind::ExecutionCount => Arc::new(ExecutionStats::new(catalog)),
        StatsKind::Activation => Arc::new(ActivationStats::new(catalog)),
        StatsKind::ExecutionSequence => Arc::new(SequenceStats::new(catalog)),
        StatsKind::Noop => Arc::new(NoopStats::new(catalog)),
    }
}
