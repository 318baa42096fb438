#![allow(dead_code)]

//! Shared engine stubs for the integration tests: a catalog, a session that
//! forwards pumped events to its listeners, and a tiny predicate-driven
//! engine that implements [`SessionSource`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use ruletally::{
    ActivationId, EventSession, RuleCatalog, RuleId, SessionListener, SessionSource, StatsKind,
};

/// In-memory catalog that tracks its stateful sessions.
pub struct StubCatalog {
    id: String,
    rules: Vec<RuleId>,
    sessions: Mutex<Vec<Arc<dyn EventSession>>>,
}

impl StubCatalog {
    pub fn new(id: &str, rules: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_owned(),
            rules: rules.iter().map(|(p, n)| RuleId::new(*p, *n)).collect(),
            sessions: Mutex::new(Vec::new()),
        })
    }
}

impl RuleCatalog for StubCatalog {
    fn group_id(&self) -> String {
        self.id.clone()
    }

    fn rules(&self) -> Vec<RuleId> {
        self.rules.clone()
    }

    fn sessions(&self) -> Vec<Arc<dyn EventSession>> {
        self.sessions.lock().clone()
    }
}

/// Activation ids are unique across all sessions, like an engine-wide
/// activation counter.
static NEXT_ACTIVATION: AtomicU64 = AtomicU64::new(1);

fn next_activation_id() -> ActivationId {
    ActivationId(NEXT_ACTIVATION.fetch_add(1, Ordering::Relaxed))
}

/// Session stub. Tests pump events through it; attached listeners see them
/// in attach order, like an engine calling its lifecycle callbacks.
pub struct StubSession {
    catalog: Arc<StubCatalog>,
    lightweight: bool,
    listeners: Mutex<Vec<Arc<dyn SessionListener>>>,
}

impl StubSession {
    /// Long-lived session, tracked by its catalog so group-wide detach
    /// reaches it.
    pub fn stateful(catalog: &Arc<StubCatalog>) -> Arc<Self> {
        let session = Arc::new(Self {
            catalog: Arc::clone(catalog),
            lightweight: false,
            listeners: Mutex::new(Vec::new()),
        });
        catalog
            .sessions
            .lock()
            .push(Arc::clone(&session) as Arc<dyn EventSession>);
        session
    }

    /// One-shot session; the catalog never learns about it.
    pub fn lightweight(catalog: &Arc<StubCatalog>) -> Arc<Self> {
        Arc::new(Self {
            catalog: Arc::clone(catalog),
            lightweight: true,
            listeners: Mutex::new(Vec::new()),
        })
    }

    fn next_id(&self) -> ActivationId {
        next_activation_id()
    }

    fn attached(&self) -> Vec<Arc<dyn SessionListener>> {
        self.listeners.lock().clone()
    }

    /// Announce the start of a run.
    pub fn start_run(&self) {
        for listener in self.attached() {
            listener.run_started();
        }
    }

    /// Create-then-fire in one step, the shape of a plain rule match.
    pub fn fire(&self, rule: &RuleId) {
        let id = self.next_id();
        for listener in self.attached() {
            listener.activation_created(id, rule);
        }
        for listener in self.attached() {
            listener.before_fired(id, rule);
        }
    }

    /// Create an activation and leave it pending.
    pub fn create(&self, rule: &RuleId) -> ActivationId {
        let id = self.next_id();
        for listener in self.attached() {
            listener.activation_created(id, rule);
        }
        id
    }

    /// Withdraw a pending activation.
    pub fn cancel(&self, id: ActivationId, rule: &RuleId) {
        for listener in self.attached() {
            listener.activation_cancelled(id, rule);
        }
    }

    /// Fire a previously created activation.
    pub fn fire_pending(&self, id: ActivationId, rule: &RuleId) {
        for listener in self.attached() {
            listener.before_fired(id, rule);
        }
    }
}

impl EventSession for StubSession {
    fn catalog(&self) -> Arc<dyn RuleCatalog> {
        Arc::clone(&self.catalog) as Arc<dyn RuleCatalog>
    }

    fn is_lightweight(&self) -> bool {
        self.lightweight
    }

    fn attach(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.lock().push(listener);
    }

    fn detach(&self, kind: StatsKind) {
        self.listeners.lock().retain(|l| l.kind() != kind);
    }

    fn listeners(&self) -> Vec<Arc<dyn SessionListener>> {
        self.attached()
    }
}

type RulePredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Predicate-driven engine: each configured rule fires once for every fact
/// its predicate matches, in configuration order. Sessions are one-shot.
pub struct SimEngine {
    catalog: Arc<StubCatalog>,
    rules: Vec<(RuleId, RulePredicate)>,
}

impl SimEngine {
    pub fn new(catalog: &Arc<StubCatalog>) -> Self {
        Self {
            catalog: Arc::clone(catalog),
            rules: Vec::new(),
        }
    }

    pub fn rule(
        mut self,
        package: &str,
        name: &str,
        matches: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rules.push((RuleId::new(package, name), Box::new(matches)));
        self
    }
}

impl SessionSource for SimEngine {
    fn catalog(&self) -> Arc<dyn RuleCatalog> {
        Arc::clone(&self.catalog) as Arc<dyn RuleCatalog>
    }

    fn new_session(&self) -> Arc<dyn EventSession> {
        StubSession::lightweight(&self.catalog) as Arc<dyn EventSession>
    }

    fn execute(&self, session: &dyn EventSession, facts: &[Value]) {
        for fact in facts {
            for (rule, matches) in &self.rules {
                if matches(fact) {
                    let id = next_activation_id();
                    for listener in session.listeners() {
                        listener.activation_created(id, rule);
                    }
                    for listener in session.listeners() {
                        listener.before_fired(id, rule);
                    }
                }
            }
        }
    }
}
