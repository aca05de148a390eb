use serde_json::Value;
use taskwire_core::{digest_hex, Template, ValidationIssue};

use crate::validate::{validate_template, ValidationError};

pub fn template_to_value(template: &Template) -> serde_json::Result<Value> {
    serde_json::to_value(template)
}

pub fn template_to_json(template: &Template) -> serde_json::Result<String> {
    serde_json::to_string_pretty(template)
}

/// The SHA-256 of the template's canonical encoding, in lowercase hex.
/// Doubles as the submission idempotency key.
pub fn template_digest_hex(template: &Template) -> serde_json::Result<String> {
    let value = template_to_value(template)?;
    digest_hex(&value)
}

/// Decodes a template and re-validates it, so a loaded document honors
/// the same invariants as a built one. A document that does not even
/// decode comes back as a validation error too, not a bare serde error.
pub fn template_from_value(value: Value) -> Result<Template, ValidationError> {
    let template: Template = serde_json::from_value(value).map_err(decode_error)?;
    let issues = validate_template(&template);
    if issues.is_empty() {
        Ok(template)
    } else {
        Err(ValidationError::new(issues))
    }
}

pub fn template_from_str(text: &str) -> Result<Template, ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(decode_error)?;
    template_from_value(value)
}

fn decode_error(err: serde_json::Error) -> ValidationError {
    ValidationError::new(vec![ValidationIssue::error(
        "template.decode.invalid",
        None,
        format!("document does not decode as a template: {err}"),
    )])
}

#[cfg(test)]
#[path = "serialize_test.rs"]
mod tests;
