use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

use crate::version::VersionRange;

/// One node of a task plan. The wire encoding is a tagged object:
/// `{"type": "service" | "sequence" | "parallel" | "condition", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Service {
        name: String,
        #[serde(default)]
        version: VersionRange,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        configuration: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry: Option<RetryPolicy>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_failure: Option<FailurePolicy>,
    },
    Sequence {
        children: Vec<Node>,
    },
    Parallel {
        children: Vec<Node>,
    },
    Condition {
        expression: ConditionExpression,
        #[serde(rename = "then")]
        then_branch: Box<Node>,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        else_branch: Option<Box<Node>>,
    },
}

impl Node {
    /// The key later nodes use to read this node's result: the alias when
    /// set, otherwise the service name. Non-service nodes produce no key.
    pub fn result_key(&self) -> Option<&str> {
        match self {
            Node::Service { name, alias, .. } => Some(alias.as_deref().unwrap_or(name)),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Service { .. } => "service",
            Node::Sequence { .. } => "sequence",
            Node::Parallel { .. } => "parallel",
            Node::Condition { .. } => "condition",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

/// What to do when a service node fails after its retries are spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Absorb the failure and continue without this node's output.
    Skip,
    /// Run a substitute subtree and take its outcome as this node's.
    Branch { node: Box<Node> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "===")]
    Eq,
    #[serde(rename = "!==")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "===",
            ComparisonOp::Ne => "!==",
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Le => "<=",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Gt | ComparisonOp::Lt | ComparisonOp::Ge | ComparisonOp::Le
        )
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition as carried on the wire: the left operand stays in its
/// `service{ref}.path` source form and is compiled by taskwire-expr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionExpression {
    pub left: String,
    pub op: ComparisonOp,
    pub right: Value,
}

/// An immutable task plan: an ordered sequence of top-level nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Template {
    pub nodes: Vec<Node>,
}

#[cfg(test)]
#[path = "node_test.rs"]
mod tests;
