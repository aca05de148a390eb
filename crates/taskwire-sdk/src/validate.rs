use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use taskwire_core::{FailurePolicy, Node, Template, ValidationIssue};
use taskwire_expr::ReferenceExpression;

const KEY_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_-]*$";

/// Raised when a template (or a document decoding into one) breaks the
/// structural rules. Carries every issue found, already stably sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(mut issues: Vec<ValidationIssue>) -> Self {
        ValidationIssue::sort_stable(&mut issues);
        Self { issues }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "template validation failed ({} issues):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Checks the whole tree and reports every violation found, never just
/// the first.
pub fn validate_template(template: &Template) -> Vec<ValidationIssue> {
    let mut walker = Walker {
        issues: Vec::new(),
        seen: BTreeMap::new(),
        key_pattern: Regex::new(KEY_PATTERN).expect("valid regex"),
    };
    let mut scope = BTreeSet::new();
    for (index, node) in template.nodes.iter().enumerate() {
        let path = format!("nodes[{index}]");
        walker.visit(node, &path, &mut scope, &BTreeSet::new());
    }
    ValidationIssue::sort_stable(&mut walker.issues);
    walker.issues
}

struct Walker {
    issues: Vec<ValidationIssue>,
    /// Every result key in the template, mapped to the path that first
    /// declared it. Duplicates are global, not per scope.
    seen: BTreeMap<String, String>,
    key_pattern: Regex,
}

impl Walker {
    /// Validates one node. `scope` holds the result keys visible to this
    /// node and gains the node's own keys before returning; `forbidden`
    /// holds sibling keys inside the enclosing parallel group.
    fn visit(
        &mut self,
        node: &Node,
        path: &str,
        scope: &mut BTreeSet<String>,
        forbidden: &BTreeSet<String>,
    ) {
        match node {
            Node::Service {
                name,
                version,
                alias,
                retry,
                on_failure,
                ..
            } => {
                if name.is_empty() {
                    self.error("template.service.name.empty", path, "service name must not be empty");
                }
                if let Err(err) = version.spec() {
                    self.error(
                        "template.version.invalid",
                        path,
                        format!("invalid version range `{version}`: {err}"),
                    );
                }
                if let Some(alias) = alias {
                    if !self.key_pattern.is_match(alias) {
                        self.error(
                            "template.alias.invalid",
                            path,
                            format!("alias `{alias}` is not a valid identifier"),
                        );
                    }
                }
                if let Some(retry) = retry {
                    if retry.max_attempts == 0 {
                        self.error(
                            "template.retry.invalid",
                            path,
                            "retry max_attempts must be at least 1",
                        );
                    }
                }
                if let Some(FailurePolicy::Branch { node: substitute }) = on_failure {
                    let substitute_path = format!("{path}.on_failure");
                    self.visit(substitute, &substitute_path, scope, forbidden);
                }
                if let Some(key) = node.result_key() {
                    self.declare(key, path);
                    scope.insert(key.to_string());
                }
            }
            Node::Sequence { children } => {
                for (index, child) in children.iter().enumerate() {
                    let child_path = format!("{path}.children[{index}]");
                    self.visit(child, &child_path, scope, forbidden);
                }
            }
            Node::Parallel { children } => {
                // Each branch sees the outer scope only; sibling outputs
                // are invisible until the whole group completes.
                let branch_keys: Vec<BTreeSet<String>> =
                    children.iter().map(collect_keys).collect();
                for (index, child) in children.iter().enumerate() {
                    let child_path = format!("{path}.children[{index}]");
                    let mut sibling_keys = BTreeSet::new();
                    for (other, keys) in branch_keys.iter().enumerate() {
                        if other != index {
                            sibling_keys.extend(keys.iter().cloned());
                        }
                    }
                    let mut branch_scope = scope.clone();
                    self.visit(child, &child_path, &mut branch_scope, &sibling_keys);
                }
                for keys in branch_keys {
                    scope.extend(keys);
                }
            }
            Node::Condition {
                expression,
                then_branch,
                else_branch,
            } => {
                self.check_reference(&expression.left, path, scope, forbidden);
                if matches!(&**then_branch, Node::Sequence { children } if children.is_empty()) {
                    self.error(
                        "template.condition.then.empty",
                        path,
                        "condition has no then branch",
                    );
                }
                let then_path = format!("{path}.then");
                let mut then_scope = scope.clone();
                self.visit(then_branch, &then_path, &mut then_scope, forbidden);
                let mut else_scope = scope.clone();
                if let Some(else_branch) = else_branch {
                    let else_path = format!("{path}.else");
                    self.visit(else_branch, &else_path, &mut else_scope, forbidden);
                }
                // Either branch may have produced results by the time a
                // later node runs, so both contribute to the scope.
                scope.extend(then_scope);
                scope.extend(else_scope);
            }
        }
    }

    fn check_reference(
        &mut self,
        source: &str,
        path: &str,
        scope: &BTreeSet<String>,
        forbidden: &BTreeSet<String>,
    ) {
        let reference = match ReferenceExpression::parse(source) {
            Ok(reference) => reference,
            Err(err) => {
                self.error(
                    "template.ref.malformed",
                    path,
                    format!("invalid reference `{source}`: {err}"),
                );
                return;
            }
        };
        if scope.contains(reference.key()) {
            return;
        }
        if forbidden.contains(reference.key()) {
            self.error(
                "template.ref.parallel_sibling",
                path,
                format!(
                    "reference `{source}` reads a sibling of the same parallel group",
                ),
            );
        } else {
            self.error(
                "template.ref.unresolved",
                path,
                format!("reference `{source}` does not resolve to an earlier node"),
            );
        }
    }

    fn declare(&mut self, key: &str, path: &str) {
        if let Some(first) = self.seen.get(key) {
            let message =
                format!("result key `{key}` is already used at {first}; aliases must be unique");
            self.issues.push(ValidationIssue::error(
                "template.alias.duplicate",
                Some(path.to_string()),
                message,
            ));
        } else {
            self.seen.insert(key.to_string(), path.to_string());
        }
    }

    fn error(&mut self, code: &str, path: &str, message: impl Into<String>) {
        self.issues
            .push(ValidationIssue::error(code, Some(path.to_string()), message));
    }
}

/// All result keys a subtree can produce, substitutes included.
fn collect_keys(node: &Node) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    collect_keys_into(node, &mut keys);
    keys
}

fn collect_keys_into(node: &Node, keys: &mut BTreeSet<String>) {
    match node {
        Node::Service { on_failure, .. } => {
            if let Some(key) = node.result_key() {
                keys.insert(key.to_string());
            }
            if let Some(FailurePolicy::Branch { node: substitute }) = on_failure {
                collect_keys_into(substitute, keys);
            }
        }
        Node::Sequence { children } | Node::Parallel { children } => {
            for child in children {
                collect_keys_into(child, keys);
            }
        }
        Node::Condition {
            then_branch,
            else_branch,
            ..
        } => {
            collect_keys_into(then_branch, keys);
            if let Some(else_branch) = else_branch {
                collect_keys_into(else_branch, keys);
            }
        }
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
