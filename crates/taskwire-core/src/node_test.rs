use super::{ComparisonOp, FailurePolicy, Node, RetryPolicy, Template};
use crate::version::VersionRange;
use serde_json::json;

fn service(name: &str) -> Node {
    Node::Service {
        name: name.to_string(),
        version: VersionRange::any(),
        configuration: None,
        alias: None,
        retry: None,
        on_failure: None,
    }
}

#[test]
fn service_wire_shape_omits_absent_options() {
    let encoded = serde_json::to_value(service("billing")).expect("must encode");
    assert_eq!(encoded, json!({"type": "service", "name": "billing", "version": "*"}));
}

#[test]
fn service_version_defaults_to_wildcard() {
    let decoded: Node =
        serde_json::from_value(json!({"type": "service", "name": "billing"})).expect("must decode");
    match decoded {
        Node::Service { version, .. } => assert_eq!(version, VersionRange::any()),
        other => panic!("unexpected node: {other:?}"),
    }
}

#[test]
fn result_key_prefers_alias() {
    let mut node = service("billing");
    assert_eq!(node.result_key(), Some("billing"));
    if let Node::Service { alias, .. } = &mut node {
        *alias = Some("invoice".to_string());
    }
    assert_eq!(node.result_key(), Some("invoice"));
    assert_eq!(Node::Sequence { children: vec![] }.result_key(), None);
}

#[test]
fn condition_round_trip() {
    let doc = json!({
        "type": "condition",
        "expression": {"left": "service{check}.approved", "op": "===", "right": true},
        "then": {"type": "service", "name": "ship", "version": "*"},
        "else": {"type": "service", "name": "refund", "version": "*"},
    });
    let decoded: Node = serde_json::from_value(doc.clone()).expect("must decode");
    match &decoded {
        Node::Condition { expression, else_branch, .. } => {
            assert_eq!(expression.op, ComparisonOp::Eq);
            assert!(else_branch.is_some());
        }
        other => panic!("unexpected node: {other:?}"),
    }
    assert_eq!(serde_json::to_value(&decoded).expect("must encode"), doc);
}

#[test]
fn failure_policy_tagging() {
    let skip: FailurePolicy = serde_json::from_value(json!({"policy": "skip"})).expect("must decode");
    assert_eq!(skip, FailurePolicy::Skip);

    let branch: FailurePolicy = serde_json::from_value(json!({
        "policy": "branch",
        "node": {"type": "service", "name": "fallback", "version": "*"},
    }))
    .expect("must decode");
    assert!(matches!(branch, FailurePolicy::Branch { .. }));
}

#[test]
fn retry_policy_round_trip() {
    let retry = RetryPolicy { max_attempts: 3, delay_ms: 250 };
    let encoded = serde_json::to_value(retry).expect("must encode");
    assert_eq!(encoded, json!({"max_attempts": 3, "delay_ms": 250}));
}

#[test]
fn comparison_op_wire_symbols() {
    for (op, symbol) in [
        (ComparisonOp::Eq, "==="),
        (ComparisonOp::Ne, "!=="),
        (ComparisonOp::Gt, ">"),
        (ComparisonOp::Lt, "<"),
        (ComparisonOp::Ge, ">="),
        (ComparisonOp::Le, "<="),
    ] {
        assert_eq!(serde_json::to_value(op).expect("must encode"), json!(symbol));
        assert_eq!(op.to_string(), symbol);
    }
    assert!(ComparisonOp::Gt.is_ordering());
    assert!(!ComparisonOp::Eq.is_ordering());
}

#[test]
fn template_rejects_unknown_fields() {
    let err = serde_json::from_value::<Template>(json!({"nodes": [], "extra": 1}))
        .expect_err("must reject");
    assert!(err.to_string().contains("extra"));
}
