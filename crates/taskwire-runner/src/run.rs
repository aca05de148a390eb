use futures::executor::block_on;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::fs;
use taskwire_core::canonical_json_bytes;
use taskwire_sdk::{
    encode_event_jsonl_line, template_digest_hex, template_to_value, ErrorKind, EventSequencer,
    LocalOperator, Producer, TaskOutcome, UpdateEvent,
};

use crate::cli::{CanonCommand, OutputFormat, RunCommand, ValidateCommand};
use crate::io::{read_bindings_document, read_template_document, DocumentError};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("task input parse failed: {0}")]
    InputParse(String),
    #[error("meta entry `{0}` is not `key=value`")]
    MetaFormat(String),
    #[error("write events JSONL failed `{path}`: {reason}")]
    EventsIo { path: String, reason: String },
    #[error("json encode failed: {0}")]
    JsonEncode(#[from] serde_json::Error),
}

pub fn execute_validate(command: &ValidateCommand) -> Result<String, RunnerError> {
    let template = read_template_document(&command.template)?;
    let digest = template_digest_hex(&template)?;
    match command.format {
        OutputFormat::Text => Ok(format!("template is valid (digest {digest})")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "valid": true,
            "digest": digest,
            "nodes": template.nodes.len(),
        }))?),
    }
}

pub fn execute_canon(command: &CanonCommand) -> Result<String, RunnerError> {
    let template = read_template_document(&command.template)?;
    if command.digest {
        return Ok(template_digest_hex(&template)?);
    }
    let bytes = canonical_json_bytes(&template_to_value(&template)?)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn execute_run(command: &RunCommand) -> Result<String, RunnerError> {
    let template = read_template_document(&command.template)?;
    let input = match &command.input {
        Some(text) => serde_json::from_str::<Value>(text)
            .map_err(|err| RunnerError::InputParse(err.to_string()))?,
        None => Value::Null,
    };

    let mut operator = LocalOperator::new();
    if let Some(path) = &command.bindings {
        for (service, binding) in read_bindings_document(path)? {
            match (binding.result, binding.error) {
                (Some(result), None) => {
                    operator.register(service.as_str(), move |_, _| Ok(result.clone()));
                }
                (None, Some(error)) => {
                    operator.register(service.as_str(), move |_, _| Err(error.clone()));
                }
                // read_bindings_document rejects other shapes.
                _ => {}
            }
        }
    }

    let producer = Producer::new(operator);
    let mut task = producer.task(&template)?;
    for entry in &command.meta {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(RunnerError::MetaFormat(entry.clone()));
        };
        task = task.with_meta(key, Value::String(value.to_string()));
    }
    let digest = task.digest().to_string();
    let task = task.with_input(input);

    let events = RefCell::new(Vec::<UpdateEvent>::new());
    let outcome = block_on(task.run_with(|event| events.borrow_mut().push(event.clone())));
    let events = events.into_inner();
    tracing::debug!(digest = %digest, events = events.len(), "task run finished");

    let mut sequencer = EventSequencer::new(digest.as_str());
    let mut lines = String::new();
    for event in &events {
        lines.push_str(&encode_event_jsonl_line(&sequencer.next_record(event.clone()))?);
    }

    let mut output = String::new();
    match command.events_jsonl.as_deref() {
        Some("-") => output.push_str(&lines),
        Some(path) => fs::write(path, &lines).map_err(|err| RunnerError::EventsIo {
            path: path.to_string(),
            reason: err.to_string(),
        })?,
        None => {}
    }

    match command.format {
        OutputFormat::Text => {
            match &outcome {
                TaskOutcome::Completed { value } => {
                    output.push_str(&format!("task completed: {value}"));
                }
                TaskOutcome::Failed { kind, message } => {
                    let kind = match kind {
                        ErrorKind::ServiceExecution => "service_execution",
                        ErrorKind::Transport => "transport",
                    };
                    output.push_str(&format!("task failed ({kind}): {message}"));
                }
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let outcome = match &outcome {
                TaskOutcome::Completed { value } => json!({
                    "status": "completed",
                    "value": value,
                }),
                TaskOutcome::Failed { kind, message } => json!({
                    "status": "failed",
                    "kind": kind,
                    "message": message,
                }),
            };
            output.push_str(&serde_json::to_string_pretty(&json!({
                "digest": digest,
                "events": events.len(),
                "outcome": outcome,
            }))?);
            Ok(output)
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
