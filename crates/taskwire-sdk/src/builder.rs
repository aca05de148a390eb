use serde_json::Value;
use taskwire_core::{
    ComparisonOp, ConditionExpression, FailurePolicy, Node, RetryPolicy, Template, ValidationIssue,
    VersionRange,
};

use crate::serialize;
use crate::validate::{validate_template, ValidationError};

/// Fluent constructor for a [`Template`].
///
/// Every method takes `&self` and returns a new builder; earlier values
/// stay valid and unaffected, so a half-built plan can be forked.
/// Misuse (a modifier with no service to modify, a branch with no
/// condition) is collected and reported at [`TemplateBuilder::build`]
/// together with structural validation, never panicked on.
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    nodes: Vec<Node>,
    issues: Vec<ValidationIssue>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a service node with the wildcard version range.
    pub fn add_service(&self, name: &str) -> Self {
        self.add_service_version(name, "*")
    }

    pub fn add_service_version(&self, name: &str, version: &str) -> Self {
        let mut next = self.clone();
        next.nodes.push(Node::Service {
            name: name.to_string(),
            version: VersionRange::new(version),
            configuration: None,
            alias: None,
            retry: None,
            on_failure: None,
        });
        next
    }

    pub fn with_retry(&self, max_attempts: u32, delay_ms: u64) -> Self {
        let mut next = self.clone();
        match next.nodes.last_mut() {
            Some(Node::Service { retry, .. }) => {
                *retry = Some(RetryPolicy {
                    max_attempts,
                    delay_ms,
                });
                next
            }
            _ => self.misuse("builder.retry.no_service", "with_retry"),
        }
    }

    pub fn with_configuration(&self, value: Value) -> Self {
        let mut next = self.clone();
        match next.nodes.last_mut() {
            Some(Node::Service { configuration, .. }) => {
                *configuration = Some(value);
                next
            }
            _ => self.misuse("builder.configuration.no_service", "with_configuration"),
        }
    }

    pub fn with_alias(&self, name: &str) -> Self {
        let mut next = self.clone();
        match next.nodes.last_mut() {
            Some(Node::Service { alias, .. }) => {
                *alias = Some(name.to_string());
                next
            }
            _ => self.misuse("builder.alias.no_service", "with_alias"),
        }
    }

    /// On failure of the preceding service, absorb and continue without
    /// its output.
    pub fn on_fail_skip(&self) -> Self {
        let mut next = self.clone();
        match next.nodes.last_mut() {
            Some(Node::Service { on_failure, .. }) => {
                *on_failure = Some(FailurePolicy::Skip);
                next
            }
            _ => self.misuse("builder.on_failure.no_service", "on_fail_skip"),
        }
    }

    /// On failure of the preceding service, run a substitute subtree and
    /// take its outcome as the service's.
    pub fn on_fail(&self, build: impl FnOnce(TemplateBuilder) -> TemplateBuilder) -> Self {
        let (node, issues) = subtree(build);
        let mut next = self.clone();
        next.issues.extend(issues);
        match next.nodes.last_mut() {
            Some(Node::Service { on_failure, .. }) => {
                *on_failure = Some(FailurePolicy::Branch {
                    node: Box::new(node),
                });
                next
            }
            _ => self.misuse("builder.on_failure.no_service", "on_fail"),
        }
    }

    /// Opens a nested scope and splices the result in as a sequence node.
    pub fn add_sequence(&self, build: impl FnOnce(TemplateBuilder) -> TemplateBuilder) -> Self {
        let child = build(TemplateBuilder::new());
        let mut next = self.clone();
        next.issues.extend(child.issues);
        next.nodes.push(Node::Sequence {
            children: child.nodes,
        });
        next
    }

    /// Opens a nested scope whose nodes run concurrently. Children must
    /// not reference each other's output.
    pub fn add_parallel(&self, build: impl FnOnce(TemplateBuilder) -> TemplateBuilder) -> Self {
        let child = build(TemplateBuilder::new());
        let mut next = self.clone();
        next.issues.extend(child.issues);
        next.nodes.push(Node::Parallel {
            children: child.nodes,
        });
        next
    }

    /// Appends a condition comparing a `service{key}.path` reference with
    /// a literal. Populate the branches with [`TemplateBuilder::then`]
    /// and [`TemplateBuilder::or_else`].
    pub fn add_condition(&self, left: &str, op: ComparisonOp, right: Value) -> Self {
        let mut next = self.clone();
        next.nodes.push(Node::Condition {
            expression: ConditionExpression {
                left: left.to_string(),
                op,
                right,
            },
            then_branch: Box::new(Node::Sequence { children: vec![] }),
            else_branch: None,
        });
        next
    }

    pub fn then(&self, build: impl FnOnce(TemplateBuilder) -> TemplateBuilder) -> Self {
        let (node, issues) = subtree(build);
        let mut next = self.clone();
        next.issues.extend(issues);
        match next.nodes.last_mut() {
            Some(Node::Condition { then_branch, .. }) => {
                *then_branch = Box::new(node);
                next
            }
            _ => self.misuse("builder.then.no_condition", "then"),
        }
    }

    /// The false branch. Named `or_else` because `else` is reserved.
    pub fn or_else(&self, build: impl FnOnce(TemplateBuilder) -> TemplateBuilder) -> Self {
        let (node, issues) = subtree(build);
        let mut next = self.clone();
        next.issues.extend(issues);
        match next.nodes.last_mut() {
            Some(Node::Condition { else_branch, .. }) => {
                *else_branch = Some(Box::new(node));
                next
            }
            _ => self.misuse("builder.else.no_condition", "or_else"),
        }
    }

    /// Runs full-tree validation and produces the immutable template.
    /// Reports every misuse and structural issue found, not just the
    /// first.
    pub fn build(&self) -> Result<Template, ValidationError> {
        let template = Template {
            nodes: self.nodes.clone(),
        };
        let mut issues = self.issues.clone();
        issues.extend(validate_template(&template));
        if issues.is_empty() {
            Ok(template)
        } else {
            Err(ValidationError::new(issues))
        }
    }

    pub fn to_json(&self) -> Result<String, ValidationError> {
        let template = self.build()?;
        serialize::template_to_json(&template).map_err(|err| {
            ValidationError::new(vec![ValidationIssue::error(
                "template.encode.failed",
                None,
                err.to_string(),
            )])
        })
    }

    fn misuse(&self, code: &str, method: &str) -> Self {
        let mut next = self.clone();
        next.issues.push(ValidationIssue::error(
            code,
            None,
            format!("`{method}` needs a preceding node of the right kind"),
        ));
        next
    }
}

/// Builds a child scope and collapses it to a single node: the node
/// itself when the scope holds exactly one, a sequence otherwise.
fn subtree(
    build: impl FnOnce(TemplateBuilder) -> TemplateBuilder,
) -> (Node, Vec<ValidationIssue>) {
    let mut child = build(TemplateBuilder::new());
    let node = if child.nodes.len() == 1 {
        child.nodes.remove(0)
    } else {
        Node::Sequence {
            children: child.nodes,
        }
    };
    (node, child.issues)
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
