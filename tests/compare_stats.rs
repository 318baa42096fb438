mod harness;

use harness::{StubCatalog, StubSession};
use ruletally::{DiffEngine, RuleId, StatsKind, StatsRegistry, SAME_HEADER};
use serde_json::Value;

/// Renders an execution snapshot where `hot` fired `n` times and `cold`
/// never did.
fn fire_n(registry: &StatsRegistry, group: &str, n: usize) -> String {
    let catalog = StubCatalog::new(group, &[("demo", "hot"), ("demo", "cold")]);
    let session = StubSession::stateful(&catalog);
    registry.register(session.as_ref(), StatsKind::ExecutionCount);
    let rule = RuleId::new("demo", "hot");
    session.start_run();
    for _ in 0..n {
        session.fire(&rule);
    }
    registry
        .stats_json(group, StatsKind::ExecutionCount)
        .unwrap()
}

fn assert_all_same(value: &Value) {
    match value {
        Value::String(text) => assert!(text.starts_with(SAME_HEADER), "differs: {text}"),
        Value::Array(items) => items.iter().for_each(assert_all_same),
        Value::Object(map) => map.values().for_each(assert_all_same),
        other => panic!("unexpected node: {other}"),
    }
}

#[test]
fn snapshot_against_itself_is_all_same() {
    let registry = StatsRegistry::new();
    let rendered = fire_n(&registry, "kb-self", 3);

    let report = DiffEngine::new().compare_stats(&rendered, &rendered);
    let parsed: Value = serde_json::from_str(&report).unwrap();

    assert_all_same(&parsed);
    // Equal containers collapse instead of being walked.
    assert_eq!(parsed["children"], "= [...]");
    assert_eq!(parsed["notExecutedRules"], "= [...]");
}

#[test]
fn diverging_counts_are_reported_in_place() {
    let registry = StatsRegistry::new();
    let base = fire_n(&registry, "kb-base", 3);
    let working = fire_n(&registry, "kb-work", 5);

    let report = DiffEngine::new().compare_stats(&base, &working);
    let parsed: Value = serde_json::from_str(&report).unwrap();

    assert_eq!(parsed["name"], "= EXECUTION_COUNT");
    assert_eq!(parsed["sessionGroupId"], "! kb-base -> kb-work");
    assert_eq!(parsed["executionCount"], "= 1");

    let child = &parsed["children"][0];
    assert_eq!(child["name"], "= (Exec)hot");
    assert_eq!(child["count"], "! 3 -> 5 (+2, +66.7%)");
}

#[test]
fn orientation_follows_argument_order() {
    let diff = DiffEngine::new();
    let a = r#"{"executionCount": 3}"#;
    let b = r#"{"executionCount": 5}"#;

    let ab: Value = serde_json::from_str(&diff.compare_stats(a, b)).unwrap();
    let ba: Value = serde_json::from_str(&diff.compare_stats(b, a)).unwrap();

    // Equality is symmetric, the report is not: argument order picks the
    // baseline.
    assert_eq!(ab["executionCount"], "! 3 -> 5 (+2, +66.7%)");
    assert_eq!(ba["executionCount"], "! 5 -> 3 (-2, -40.0%)");
}

#[test]
fn sequence_divergence_point_is_visible() {
    let registry = StatsRegistry::new();
    let render_sequence = |group: &str, order: &[&str]| {
        let catalog = StubCatalog::new(group, &[("demo", "a"), ("demo", "b"), ("demo", "c")]);
        let session = StubSession::stateful(&catalog);
        registry.register(session.as_ref(), StatsKind::ExecutionSequence);
        session.start_run();
        for name in order {
            session.fire(&RuleId::new("demo", *name));
        }
        registry
            .stats_json(group, StatsKind::ExecutionSequence)
            .unwrap()
    };
    let base = render_sequence("kb-seq-base", &["a", "b", "c"]);
    let working = render_sequence("kb-seq-work", &["a", "c", "b"]);

    let report = DiffEngine::new().compare_stats(&base, &working);
    let parsed: Value = serde_json::from_str(&report).unwrap();

    assert_eq!(parsed["ruleExecutionCount"], "= 3");
    let seq = parsed["ruleSequence"].as_array().unwrap();
    assert_eq!(seq[0], "= a");
    assert_eq!(seq[1], "! b -> c");
    assert_eq!(seq[2], "! c -> b");
}

#[test]
fn shorter_numeric_list_pads_with_null() {
    let diff = DiffEngine::new();
    let report = diff.compare_facts("[1, 2, 3]", "[1, 2, 3, 4, 5]");
    let parsed: Value = serde_json::from_str(&report).unwrap();

    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[2], "= 3");
    assert_eq!(items[3], "! null -> 4");
    assert_eq!(items[4], "! null -> 5");
}
