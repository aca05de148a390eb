use super::validate_template;
use crate::builder::TemplateBuilder;
use serde_json::json;
use taskwire_core::{ComparisonOp, Template};

fn codes(template: &Template) -> Vec<String> {
    validate_template(template)
        .into_iter()
        .map(|issue| issue.code)
        .collect()
}

#[test]
fn valid_template_has_no_issues() {
    let template = TemplateBuilder::new()
        .add_service("fetch")
        .add_condition("service{fetch}.count", ComparisonOp::Gt, json!(0))
        .then(|b| b.add_service("store"))
        .build()
        .expect("must build");
    assert!(codes(&template).is_empty());
}

#[test]
fn reference_to_later_node_is_unresolved() {
    let err = TemplateBuilder::new()
        .add_service("first")
        .add_condition("service{second}.done", ComparisonOp::Eq, json!(true))
        .then(|b| b.add_service("second"))
        .build()
        .expect_err("must fail");
    assert!(err.issues.iter().any(|i| i.code == "template.ref.unresolved"));
}

#[test]
fn parallel_sibling_reference_is_rejected_with_its_own_code() {
    let err = TemplateBuilder::new()
        .add_parallel(|p| {
            p.add_service("s1")
                .add_sequence(|s| {
                    s.add_condition("service{s1}.done", ComparisonOp::Eq, json!(true))
                        .then(|b| b.add_service("guarded"))
                })
        })
        .build()
        .expect_err("must fail");
    assert!(err
        .issues
        .iter()
        .any(|i| i.code == "template.ref.parallel_sibling"));
}

#[test]
fn parallel_outputs_are_visible_after_the_group() {
    let template = TemplateBuilder::new()
        .add_parallel(|p| p.add_service("s1").add_service("s2"))
        .add_condition("service{s1}.done", ComparisonOp::Eq, json!(true))
        .then(|b| b.add_service("after"))
        .build()
        .expect("must build");
    assert!(codes(&template).is_empty());
}

#[test]
fn parallel_branch_sees_the_outer_scope() {
    let template = TemplateBuilder::new()
        .add_service("before")
        .add_parallel(|p| {
            p.add_sequence(|s| {
                s.add_condition("service{before}.ok", ComparisonOp::Eq, json!(true))
                    .then(|b| b.add_service("inner"))
            })
            .add_service("other")
        })
        .build()
        .expect("must build");
    assert!(codes(&template).is_empty());
}

#[test]
fn either_condition_branch_key_is_in_scope_afterwards() {
    let template = TemplateBuilder::new()
        .add_service("check")
        .add_condition("service{check}.ok", ComparisonOp::Eq, json!(true))
        .then(|b| b.add_service("ship"))
        .or_else(|b| b.add_service("refund"))
        .add_condition("service{refund}.done", ComparisonOp::Eq, json!(true))
        .then(|b| b.add_service("notify"))
        .build()
        .expect("must build");
    assert!(codes(&template).is_empty());
}

#[test]
fn substitute_branch_key_registers_for_duplicates() {
    let err = TemplateBuilder::new()
        .add_service("primary")
        .on_fail(|b| b.add_service("fallback"))
        .add_service("fallback")
        .build()
        .expect_err("must fail");
    assert!(err.issues.iter().any(|i| i.code == "template.alias.duplicate"));
}

#[test]
fn malformed_reference_is_reported() {
    let err = TemplateBuilder::new()
        .add_service("check")
        .add_condition("check.done", ComparisonOp::Eq, json!(true))
        .then(|b| b.add_service("next"))
        .build()
        .expect_err("must fail");
    assert!(err.issues.iter().any(|i| i.code == "template.ref.malformed"));
}

#[test]
fn bad_alias_shape_is_reported() {
    let err = TemplateBuilder::new()
        .add_service("fetch")
        .with_alias("1bad alias")
        .build()
        .expect_err("must fail");
    assert!(err.issues.iter().any(|i| i.code == "template.alias.invalid"));
}

#[test]
fn empty_service_name_is_reported() {
    let err = TemplateBuilder::new().add_service("").build().expect_err("must fail");
    assert!(err
        .issues
        .iter()
        .any(|i| i.code == "template.service.name.empty"));
}

#[test]
fn issues_come_back_sorted() {
    let err = TemplateBuilder::new()
        .add_service_version("z", "??")
        .add_service("z")
        .build()
        .expect_err("must fail");
    let mut sorted = err.issues.clone();
    taskwire_core::ValidationIssue::sort_stable(&mut sorted);
    assert_eq!(err.issues, sorted);
}
