//! Seams to the host rule engine.
//!
//! The engine owns sessions, decides when rules activate and fire, and knows
//! the rule catalog; this crate only observes. A host integrates by
//! implementing [`RuleCatalog`] for its loaded rule-base and [`EventSession`]
//! for its session handle, then forwarding its own lifecycle callbacks into
//! the [`SessionListener`]s attached to each session.

use std::sync::Arc;

use crate::types::{ActivationId, RuleId, StatsKind};

/// A loaded rule-base as the collectors see it: the session-group identity,
/// the rule catalog, and the sessions currently alive on it.
pub trait RuleCatalog: Send + Sync {
    /// Identity shared by every session built from this catalog; statistics
    /// are scoped to it, not to individual sessions.
    fn group_id(&self) -> String;

    /// Every rule identity the catalog knows.
    fn rules(&self) -> Vec<RuleId>;

    /// Sessions currently alive on this catalog. One-shot sessions that were
    /// already discarded need not appear.
    fn sessions(&self) -> Vec<Arc<dyn EventSession>>;
}

/// One engine session that statistics listeners attach to.
pub trait EventSession: Send + Sync {
    /// The catalog this session was built from.
    fn catalog(&self) -> Arc<dyn RuleCatalog>;

    /// True for one-shot sessions that never emit a run-started event. The
    /// run counter is bumped once at registration for these, on the
    /// assumption that each registration corresponds to exactly one run.
    fn is_lightweight(&self) -> bool {
        false
    }

    /// Attach a listener; the engine forwards events to it until detached.
    fn attach(&self, listener: Arc<dyn SessionListener>);

    /// Detach every listener of the given kind.
    fn detach(&self, kind: StatsKind);

    /// The listeners currently attached, in attach order.
    fn listeners(&self) -> Vec<Arc<dyn SessionListener>>;

    /// True when a listener of `kind` is already attached (re-registration
    /// is detected through this).
    fn has_listener(&self, kind: StatsKind) -> bool {
        self.listeners().iter().any(|l| l.kind() == kind)
    }
}

/// Receiver for one session's rule-lifecycle events.
///
/// Implementations are the collectors' per-session adapters. Every method is
/// called synchronously on the evaluating thread, so they must stay O(1) and
/// never block or perform I/O.
pub trait SessionListener: Send + Sync {
    /// The statistics kind this listener feeds.
    fn kind(&self) -> StatsKind;

    /// A new activation of `rule` became pending.
    fn activation_created(&self, activation: ActivationId, rule: &RuleId);

    /// A pending activation of `rule` was withdrawn before firing.
    fn activation_cancelled(&self, activation: ActivationId, rule: &RuleId);

    /// A pending activation of `rule` is about to fire.
    fn before_fired(&self, activation: ActivationId, rule: &RuleId);

    /// An explicit run began. One-shot sessions never call this; see
    /// [`EventSession::is_lightweight`].
    fn run_started(&self);
}
