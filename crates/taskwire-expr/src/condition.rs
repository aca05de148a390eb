use serde_json::Value;
use taskwire_core::{ComparisonOp, ConditionExpression};

use crate::reference::{ReferenceExpression, ReferenceParseError};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("condition left operand is not a valid reference: {0}")]
    BadReference(#[from] ReferenceParseError),
    #[error("no result is available under key `{0}`")]
    UnknownKey(String),
    #[error("path `{path}` resolves to nothing in the result of `{key}`")]
    UnresolvedPath { key: String, path: String },
    #[error("operator `{op}` needs two numbers or two strings, got {left} and {right}")]
    Incomparable {
        op: ComparisonOp,
        left: &'static str,
        right: &'static str,
    },
}

/// Evaluates a condition against completed results, looked up by result
/// key. The left operand is compiled from its source form first, so a
/// malformed reference fails here rather than being silently false.
pub fn evaluate<'a, F>(expression: &ConditionExpression, lookup: F) -> Result<bool, EvalError>
where
    F: Fn(&str) -> Option<&'a Value>,
{
    let reference = ReferenceExpression::parse(&expression.left)?;
    let Some(result) = lookup(reference.key()) else {
        return Err(EvalError::UnknownKey(reference.key().to_string()));
    };
    let Some(left) = reference.path().resolve(result) else {
        return Err(EvalError::UnresolvedPath {
            key: reference.key().to_string(),
            path: reference.path().to_string(),
        });
    };
    compare(left, expression.op, &expression.right)
}

/// Structural equality for `===`/`!==`; ordering operators require both
/// operands to be numbers, or both strings.
pub fn compare(left: &Value, op: ComparisonOp, right: &Value) -> Result<bool, EvalError> {
    match op {
        ComparisonOp::Eq => Ok(left == right),
        ComparisonOp::Ne => Ok(left != right),
        ComparisonOp::Gt => Ok(ordering(left, op, right)?.is_gt()),
        ComparisonOp::Lt => Ok(ordering(left, op, right)?.is_lt()),
        ComparisonOp::Ge => Ok(ordering(left, op, right)?.is_ge()),
        ComparisonOp::Le => Ok(ordering(left, op, right)?.is_le()),
    }
}

fn ordering(left: &Value, op: ComparisonOp, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    let incomparable = || EvalError::Incomparable {
        op,
        left: type_name(left),
        right: type_name(right),
    };
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().ok_or_else(incomparable)?;
            let b = b.as_f64().ok_or_else(incomparable)?;
            a.partial_cmp(&b).ok_or_else(incomparable)
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(incomparable()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "condition_test.rs"]
mod tests;
