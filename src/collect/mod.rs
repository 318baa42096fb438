//! Statistics collectors.
//!
//! Four variants implement [`RuntimeStats`]: [`ExecutionStats`] (per-rule
//! fire tally), [`ActivationStats`] (four-level causal counters),
//! [`SequenceStats`] (ordered fire log), and [`NoopStats`] (elapsed time
//! only). A collector is shared by every session of its group; per-session
//! state — the "most recently fired" rule — lives in the listener adapter
//! each variant attaches.

mod activation;
mod execution;
mod noop;
mod sequence;

pub use activation::ActivationStats;
pub use execution::ExecutionStats;
pub use noop::NoopStats;
pub use sequence::SequenceStats;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::engine::{EventSession, RuleCatalog};
use crate::types::{StatsKind, StatsSnapshot};

/// The polymorphic collector contract the registry stores.
pub trait RuntimeStats: Send + Sync {
    /// Which variant this is.
    fn kind(&self) -> StatsKind;

    /// Attach this collector's listener to `session`. A session that already
    /// has a listener of this kind is left untouched; a lightweight session
    /// has its one run counted here instead of waiting for a run-started
    /// event that will never come.
    fn attach(self: Arc<Self>, session: &dyn EventSession);

    /// Detach this collector's listener from `session`. Lightweight sessions
    /// are skipped; their listeners are discarded with the session.
    fn detach(&self, session: &dyn EventSession);

    /// Detach from every live session of the group.
    fn detach_all(&self);

    /// Zero every counter, drop accumulated state, and restart the reset
    /// clock. May race with concurrent counting; stragglers lose their
    /// increment but nothing panics and subsequent counts start clean.
    fn clear(&self);

    /// Serializable view of the current state.
    fn snapshot(&self) -> StatsSnapshot;
}

/// State every variant shares: the catalog handle and the reset clock.
pub(crate) struct StatsBase {
    catalog: Arc<dyn RuleCatalog>,
    last_reset: Mutex<DateTime<Utc>>,
}

impl StatsBase {
    pub(crate) fn new(catalog: Arc<dyn RuleCatalog>) -> Self {
        StatsBase {
            catalog,
            last_reset: Mutex::new(Utc::now()),
        }
    }

    pub(crate) fn catalog(&self) -> &Arc<dyn RuleCatalog> {
        &self.catalog
    }

    pub(crate) fn group_id(&self) -> String {
        self.catalog.group_id()
    }

    /// Restart the reset clock.
    pub(crate) fn touch(&self) {
        *self.last_reset.lock() = Utc::now();
    }

    pub(crate) fn last_reset(&self) -> DateTime<Utc> {
        *self.last_reset.lock()
    }

    pub(crate) fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.last_reset()).num_milliseconds()
    }

    /// Snapshot scaffold with the shared header fields filled in.
    pub(crate) fn snapshot(&self, kind: StatsKind) -> StatsSnapshot {
        StatsSnapshot {
            name: kind.as_str().to_owned(),
            session_group_id: self.group_id(),
            last_reset: self.last_reset(),
            elapsed_milliseconds: self.elapsed_ms(),
            execution_count: None,
            not_executed_rules: None,
            children: None,
            rule_execution_count: None,
            rule_sequence: None,
        }
    }
}

/// Detach listeners of `kind` from one session, unless the session is
/// lightweight (those are discarded whole, listeners included).
pub(crate) fn detach_session(kind: StatsKind, session: &dyn EventSession) {
    if session.is_lightweight() {
        return;
    }
    session.detach(kind);
}

/// Detach listeners of `kind` from every live session of the catalog.
pub(crate) fn detach_group(kind: StatsKind, catalog: &dyn RuleCatalog) {
    for session in catalog.sessions() {
        detach_session(kind, session.as_ref());
    }
}
