//! Firing-order recording.
//!
//! [`SequenceStats`] keeps the exact order in which rules fired, which is
//! what you want when two configurations disagree and the counts alone do
//! not say where they diverged. The log grows by one entry per firing, so
//! unlike the counting collectors it is only meant for a single session at
//! a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::collect::{detach_group, detach_session, RuntimeStats, StatsBase};
use crate::engine::{EventSession, RuleCatalog, SessionListener};
use crate::types::{ActivationId, RuleId, StatsKind, StatsSnapshot};

/// Entries per allocation block of the log.
const CHUNK_SIZE: usize = 8192;

/// Append-only list of rule names, allocated in fixed-size chunks so a long
/// run never reallocates what it already recorded.
struct SequenceLog {
    chunks: Vec<Vec<String>>,
    len: usize,
}

impl SequenceLog {
    fn new() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }

    fn push(&mut self, name: String) {
        match self.chunks.last_mut() {
            Some(chunk) if chunk.len() < CHUNK_SIZE => chunk.push(name),
            _ => {
                let mut chunk = Vec::with_capacity(CHUNK_SIZE);
                chunk.push(name);
                self.chunks.push(chunk);
            }
        }
        self.len += 1;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    fn iter(&self) -> SequenceIter<'_> {
        SequenceIter {
            log: self,
            chunk: 0,
            pos: 0,
        }
    }
}

struct SequenceIter<'a> {
    log: &'a SequenceLog,
    chunk: usize,
    pos: usize,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let chunk = self.log.chunks.get(self.chunk)?;
            if let Some(name) = chunk.get(self.pos) {
                self.pos += 1;
                return Some(name.as_str());
            }
            self.chunk += 1;
            self.pos = 0;
        }
    }
}

/// Records the firing order of one session of the session group.
pub struct SequenceStats {
    base: StatsBase,
    log: Mutex<SequenceLog>,
    runs: AtomicU64,
}

impl SequenceStats {
    /// Creates an empty collector for the catalog's session group.
    #[must_use]
    pub fn new(catalog: Arc<dyn RuleCatalog>) -> Self {
        Self {
            base: StatsBase::new(catalog),
            log: Mutex::new(SequenceLog::new()),
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

    /// Number of firings recorded so far.
    #[must_use]
    pub fn recorded_count(&self) -> usize {
        self.log.lock().len()
    }

    pub(crate) fn record_fired(&self, rule: &RuleId) {
        self.log.lock().push(rule.name().to_owned());
    }

    pub(crate) fn record_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }
}

impl RuntimeStats for SequenceStats {
    fn kind(&self) -> StatsKind {
        StatsKind::ExecutionSequence
    }

    fn attach(self: Arc<Self>, session: &dyn EventSession) {
        if session.has_listener(StatsKind::ExecutionSequence) {
            return;
        }
        // A firing order only means something for one session, so taking on
        // a new session abandons whatever an earlier one recorded.
        self.detach_all();
        self.clear();
        let stats = Arc::clone(&self);
        session.attach(Arc::new(SequenceListener { stats }));
        if session.is_lightweight() {
            self.record_run();
        }
    }

    fn detach(&self, session: &dyn EventSession) {
        detach_session(StatsKind::ExecutionSequence, session);
    }

    fn detach_all(&self) {
        detach_group(StatsKind::ExecutionSequence, self.base.catalog().as_ref());
    }

    fn clear(&self) {
        self.runs.store(0, Ordering::Relaxed);
        self.log.lock().clear();
        self.base.touch();
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut snap = self.base.snapshot(StatsKind::ExecutionSequence);
        let log = self.log.lock();
        snap.execution_count = Some(self.execution_count());
        snap.rule_execution_count = Some(log.len() as u64);
        snap.rule_sequence = Some(log.iter().map(str::to_owned).collect());
        snap
    }
}

/// Session listener feeding a [`SequenceStats`] collector.
struct SequenceListener {
    stats: Arc<SequenceStats>,
}

impl SessionListener for SequenceListener {
    fn kind(&self) -> StatsKind {
        StatsKind::ExecutionSequence
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
