use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use ruletally::{
    ActivationId, CompareRunner, EventSession, RuleCatalog, RuleId, SessionListener, SessionSource,
    StatsKind, StatsRegistry, Workload,
};
use serde_json::{json, Value};

static NEXT_ACTIVATION: AtomicU64 = AtomicU64::new(1);

struct DemoCatalog {
    rules: Vec<RuleId>,
}

impl RuleCatalog for DemoCatalog {
    fn group_id(&self) -> String {
        "kb-main".to_owned()
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
}

impl EventSession for DemoSession {
    fn catalog(&self) -> Arc<dyn RuleCatalog> {
        Arc::clone(&self.catalog) as Arc<dyn RuleCatalog>
    }

    fn is_lightweight(&self) -> bool {
        true
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

type Match = Box<dyn Fn(&Value) -> bool + Send + Sync>;

fn rule(name: &str, matches: impl Fn(&Value) -> bool + Send + Sync + 'static) -> (RuleId, Match) {
    (RuleId::new("orders", name), Box::new(matches))
}

/// Fact-matching engine: each rule fires once per fact its predicate accepts.
struct DemoEngine {
    catalog: Arc<DemoCatalog>,
    rules: Vec<(RuleId, Match)>,
}

impl DemoEngine {
    fn new(rules: Vec<(RuleId, Match)>) -> Self {
        let ids = rules.iter().map(|(id, _)| id.clone()).collect();
        DemoEngine {
            catalog: Arc::new(DemoCatalog { rules: ids }),
            rules,
        }
    }
}

impl SessionSource for DemoEngine {
    fn catalog(&self) -> Arc<dyn RuleCatalog> {
        Arc::clone(&self.catalog) as Arc<dyn RuleCatalog>
    }

    fn new_session(&self) -> Arc<dyn EventSession> {
        Arc::new(DemoSession {
            catalog: Arc::clone(&self.catalog),
            listeners: Mutex::new(Vec::new()),
        })
    }

    fn execute(&self, session: &dyn EventSession, facts: &[Value]) {
        for fact in facts {
            for (id, matches) in &self.rules {
                if matches(fact) {
                    let activation =
                        ActivationId(NEXT_ACTIVATION.fetch_add(1, Ordering::Relaxed));
                    for listener in session.listeners() {
                        listener.activation_created(activation, id);
                    }
                    for listener in session.listeners() {
                        listener.before_fired(activation, id);
                    }
                }
            }
        }
    }
}

struct OrderBatches {
    units: usize,
    per_batch: usize,
}

impl Workload for OrderBatches {
    fn batches(&self) -> Box<dyn Iterator<Item = Vec<Value>> + Send + '_> {
        let per_batch = self.per_batch;
        Box::new((0..self.units).map(move |unit| {
            (0..per_batch)
                .map(|i| json!({ "order": unit * per_batch + i }))
                .collect()
        }))
    }
}

fn main() {
    // The base build approves every order, the working build only even ones.
    let base = DemoEngine::new(vec![rule("approve", |_| true)]);
    let working = DemoEngine::new(vec![rule("approve", |fact: &Value| {
        fact["order"].as_u64().is_some_and(|n| n % 2 == 0)
    })]);

    let registry = Arc::new(StatsRegistry::new());
    let runner = CompareRunner::new(Arc::clone(&registry));
    let workload = OrderBatches {
        units: 3,
        per_batch: 4,
    };

    let report = runner.compare_execution(&base, &working, &workload, StatsKind::ExecutionCount);

    println!("--- base stats ---\n{}", report.base_stats);
    println!("--- working stats ---\n{}", report.working_stats);
    println!("--- stats diff ---\n{}", report.stats_diff);
    println!("--- base facts ---\n{}", report.base_facts);
    println!("--- working facts ---\n{}", report.working_facts);
    println!("--- facts diff ---\n{}", report.facts_diff);
}
