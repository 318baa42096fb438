use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use ruletally::{
    ActivationId, EventSession, RuleCatalog, RuleId, SessionListener, StatsKind, StatsRegistry,
};

struct DemoCatalog {
    rules: Vec<RuleId>,
}

impl RuleCatalog for DemoCatalog {
    fn group_id(&self) -> String {
        "demo".to_owned()
    }

    fn rules(&self) -> Vec<RuleId> {
        self.rules.clone()
    }

    fn sessions(&self) -> Vec<Arc<dyn EventSession>> {
        Vec::new()
    }
}

struct DemoSession {
    catalog: Arc<DemoCatalog>,
    listeners: Mutex<Vec<Arc<dyn SessionListener>>>,
    next_activation: AtomicU64,
}

impl DemoSession {
    fn start_run(&self) {
        for listener in self.listeners() {
            listener.run_started();
        }
    }

    fn fire(&self, rule: &RuleId) {
        let id = ActivationId(self.next_activation.fetch_add(1, Ordering::Relaxed));
        for listener in self.listeners() {
            listener.activation_created(id, rule);
        }
        for listener in self.listeners() {
            listener.before_fired(id, rule);
        }
    }
}

impl EventSession for DemoSession {
    fn catalog(&self) -> Arc<dyn RuleCatalog> {
        Arc::clone(&self.catalog) as Arc<dyn RuleCatalog>
    }

    fn attach(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.lock().push(listener);
    }

    fn detach(&self, kind: StatsKind) {
        self.listeners.lock().retain(|l| l.kind() != kind);
    }

    fn listeners(&self) -> Vec<Arc<dyn SessionListener>> {
        self.listeners.lock().clone()
    }
}

fn main() {
    // A three-rule catalog; "audit" never fires in this run.
    let discount = RuleId::new("pricing", "discount");
    let surcharge = RuleId::new("pricing", "surcharge");
    let audit = RuleId::new("billing", "audit");
    let catalog = Arc::new(DemoCatalog {
        rules: vec![discount.clone(), surcharge.clone(), audit],
    });
    let session = Arc::new(DemoSession {
        catalog,
        listeners: Mutex::new(Vec::new()),
        next_activation: AtomicU64::new(1),
    });

    // Instrument the session
    let registry = StatsRegistry::new();
    registry.register(session.as_ref(), StatsKind::ExecutionCount);
    registry.register(session.as_ref(), StatsKind::Activation);

    // One run: two discounts and a surcharge
    session.start_run();
    session.fire(&discount);
    session.fire(&discount);
    session.fire(&surcharge);

    let mut out = std::io::stdout();
    registry
        .write_stats(&mut out, "demo", StatsKind::ExecutionCount)
        .expect("failed to write snapshot");
    println!();
    registry
        .write_stats(&mut out, "demo", StatsKind::Activation)
        .expect("failed to write snapshot");
    println!();
}
