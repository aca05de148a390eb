use super::{compare, evaluate, EvalError};
use serde_json::{json, Value};
use taskwire_core::{ComparisonOp, ConditionExpression};

fn expr(left: &str, op: ComparisonOp, right: Value) -> ConditionExpression {
    ConditionExpression {
        left: left.to_string(),
        op,
        right,
    }
}

#[test]
fn structural_equality() {
    assert_eq!(compare(&json!({"a": [1, 2]}), ComparisonOp::Eq, &json!({"a": [1, 2]})), Ok(true));
    assert_eq!(compare(&json!({"a": [1, 2]}), ComparisonOp::Eq, &json!({"a": [2, 1]})), Ok(false));
    assert_eq!(compare(&json!(null), ComparisonOp::Ne, &json!(false)), Ok(true));
}

#[test]
fn equality_never_coerces() {
    assert_eq!(compare(&json!(1), ComparisonOp::Eq, &json!("1")), Ok(false));
    assert_eq!(compare(&json!(0), ComparisonOp::Eq, &json!(false)), Ok(false));
}

#[test]
fn numeric_ordering() {
    assert_eq!(compare(&json!(3), ComparisonOp::Gt, &json!(2)), Ok(true));
    assert_eq!(compare(&json!(2.5), ComparisonOp::Le, &json!(2.5)), Ok(true));
    assert_eq!(compare(&json!(1), ComparisonOp::Ge, &json!(2)), Ok(false));
}

#[test]
fn string_ordering_is_lexicographic() {
    assert_eq!(compare(&json!("apple"), ComparisonOp::Lt, &json!("banana")), Ok(true));
    assert_eq!(compare(&json!("b"), ComparisonOp::Ge, &json!("b")), Ok(true));
}

#[test]
fn mixed_types_cannot_be_ordered() {
    let err = compare(&json!(1), ComparisonOp::Gt, &json!("1")).expect_err("must reject");
    assert!(matches!(err, EvalError::Incomparable { .. }));
    assert!(compare(&json!(true), ComparisonOp::Lt, &json!(false)).is_err());
}

#[test]
fn evaluate_resolves_through_results() {
    let results = json!({"total": 120, "items": [{"sku": "a"}]});
    let condition = expr("service{billing}.total", ComparisonOp::Gt, json!(100));
    let verdict = evaluate(&condition, |key| (key == "billing").then_some(&results));
    assert_eq!(verdict, Ok(true));
}

#[test]
fn evaluate_unknown_key_fails() {
    let condition = expr("service{billing}.total", ComparisonOp::Eq, json!(1));
    let verdict = evaluate(&condition, |_| None);
    assert_eq!(verdict, Err(EvalError::UnknownKey("billing".to_string())));
}

#[test]
fn evaluate_unresolved_path_fails() {
    let results = json!({"total": 120});
    let condition = expr("service{billing}.missing", ComparisonOp::Eq, json!(1));
    let verdict = evaluate(&condition, |_| Some(&results));
    assert!(matches!(verdict, Err(EvalError::UnresolvedPath { .. })));
}

#[test]
fn evaluate_bad_reference_fails() {
    let condition = expr("total", ComparisonOp::Eq, json!(1));
    assert!(matches!(
        evaluate(&condition, |_| None),
        Err(EvalError::BadReference(_))
    ));
}
