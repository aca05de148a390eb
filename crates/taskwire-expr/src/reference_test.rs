use super::{ReferenceExpression, ReferenceParseError};
use std::str::FromStr;

#[test]
fn simple_reference_roundtrip() {
    let parsed = ReferenceExpression::from_str("service{billing}.total").expect("must parse");
    assert_eq!(parsed.key(), "billing");
    assert_eq!(parsed.path().to_string(), "total");
    assert_eq!(parsed.to_string(), "service{billing}.total");
}

#[test]
fn deep_path_with_index() {
    let parsed =
        ReferenceExpression::from_str("service{lookup}.items[2].price").expect("must parse");
    assert_eq!(parsed.key(), "lookup");
    assert_eq!(parsed.path().to_string(), "items[2].price");
}

#[test]
fn missing_prefix_rejected() {
    let err = ReferenceExpression::from_str("billing.total").expect_err("must reject");
    assert_eq!(err, ReferenceParseError::MissingPrefix);
}

#[test]
fn unclosed_brace_rejected() {
    let err = ReferenceExpression::from_str("service{billing.total").expect_err("must reject");
    assert_eq!(err, ReferenceParseError::UnclosedBrace);
}

#[test]
fn empty_key_rejected() {
    let err = ReferenceExpression::from_str("service{}.total").expect_err("must reject");
    assert_eq!(err, ReferenceParseError::EmptyKey);
}

#[test]
fn key_with_space_rejected() {
    let err = ReferenceExpression::from_str("service{bad key}.total").expect_err("must reject");
    assert_eq!(err, ReferenceParseError::InvalidKeyChar(' '));
}

#[test]
fn missing_path_rejected() {
    assert_eq!(
        ReferenceExpression::from_str("service{billing}").expect_err("must reject"),
        ReferenceParseError::MissingPath
    );
    assert!(matches!(
        ReferenceExpression::from_str("service{billing}.").expect_err("must reject"),
        ReferenceParseError::Path(_)
    ));
}

#[test]
fn serializes_as_source_text() {
    let parsed = ReferenceExpression::from_str("service{billing}.total").expect("must parse");
    let encoded = serde_json::to_value(&parsed).expect("must encode");
    assert_eq!(encoded, serde_json::json!("service{billing}.total"));
    let decoded: ReferenceExpression = serde_json::from_value(encoded).expect("must decode");
    assert_eq!(decoded, parsed);
}

#[test]
fn deserializing_garbage_fails() {
    let err = serde_json::from_value::<ReferenceExpression>(serde_json::json!("nope"))
        .expect_err("must reject");
    assert!(err.to_string().contains("service{"));
}
