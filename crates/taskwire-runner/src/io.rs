use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use taskwire_core::Template;
use taskwire_sdk::{template_from_value, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("read file failed `{path}`: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("env placeholder expansion failed: {0}")]
    Expand(String),
    #[error("document parse failed `{path}`: {reason}")]
    Parse { path: String, reason: String },
    #[error("{0}")]
    TemplateInvalid(ValidationError),
    #[error("binding for `{service}` must set exactly one of `result` or `error`")]
    BindingShape { service: String },
}

/// One scripted service for the local operator: a fixed result or a
/// fixed failure message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Binding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reads a JSON or YAML template document, expands `${ENV}` placeholders,
/// and validates it.
pub fn read_template_document(path: &Path) -> Result<Template, DocumentError> {
    let value = read_document_value(path)?;
    template_from_value(value).map_err(DocumentError::TemplateInvalid)
}

pub fn read_bindings_document(path: &Path) -> Result<BTreeMap<String, Binding>, DocumentError> {
    let value = read_document_value(path)?;
    let bindings: BTreeMap<String, Binding> =
        serde_json::from_value(value).map_err(|err| DocumentError::Parse {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
    for (service, binding) in &bindings {
        if binding.result.is_some() == binding.error.is_some() {
            return Err(DocumentError::BindingShape {
                service: service.clone(),
            });
        }
    }
    Ok(bindings)
}

fn read_document_value(path: &Path) -> Result<Value, DocumentError> {
    let raw = fs::read_to_string(path).map_err(|source| DocumentError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let expanded = expand_env_placeholders(raw.as_str()).map_err(DocumentError::Expand)?;
    let parse_failure = |reason: String| DocumentError::Parse {
        path: path.display().to_string(),
        reason,
    };
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(expanded.as_str())
            .map_err(|err| parse_failure(format!("json decode error: {err}"))),
        Some("yaml") | Some("yml") => serde_yaml::from_str(expanded.as_str())
            .map_err(|err| parse_failure(format!("yaml decode error: {err}"))),
        _ => serde_json::from_str(expanded.as_str())
            .or_else(|_| serde_yaml::from_str(expanded.as_str()))
            .map_err(|err| parse_failure(err.to_string())),
    }
}

pub fn expand_env_placeholders(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    while let Some(start_offset) = input[cursor..].find("${") {
        let start = cursor + start_offset;
        out.push_str(&input[cursor..start]);
        let var_start = start + 2;
        let Some(end_offset) = input[var_start..].find('}') else {
            return Err("unterminated env placeholder `${...`".to_string());
        };
        let end = var_start + end_offset;
        let key = &input[var_start..end];
        if key.is_empty() {
            return Err("empty env placeholder `${}`".to_string());
        }
        let value = std::env::var(key)
            .map_err(|_| format!("missing env var for placeholder `${{{key}}}`"))?;
        out.push_str(value.as_str());
        cursor = end + 1;
    }
    out.push_str(&input[cursor..]);
    Ok(out)
}

#[cfg(test)]
#[path = "io_test.rs"]
mod tests;
