use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// One problem found while checking a template. Validation never stops at
/// the first issue; callers get the full list in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Stable machine-readable code, e.g. `template.alias.duplicate`.
    pub code: String,
    pub severity: IssueSeverity,
    /// Path of the offending node within the plan, e.g. `nodes[1].children[0]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(code: &str, node: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: IssueSeverity::Error,
            node,
            message: message.into(),
        }
    }

    pub fn warning(code: &str, node: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: IssueSeverity::Warning,
            node,
            message: message.into(),
        }
    }

    pub fn sort_stable(issues: &mut [Self]) {
        issues.sort_by(|left, right| {
            (left.severity, &left.code, &left.node, &left.message).cmp(&(
                right.severity,
                &right.code,
                &right.node,
                &right.message,
            ))
        });
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        match &self.node {
            Some(node) => write!(f, "{severity} [{}] at {node}: {}", self.code, self.message),
            None => write!(f, "{severity} [{}]: {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
#[path = "issues_test.rs"]
mod tests;
