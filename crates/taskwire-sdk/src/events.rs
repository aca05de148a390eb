use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TASK_EVENT_SCHEMA: &str = "taskwire-task-event/0.1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Started,
    Retrying,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ServiceExecution,
    Transport,
}

/// One progress update from the operator. `Completed` and `Failed` are
/// terminal; a well-formed stream carries exactly one terminal event and
/// nothing after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum UpdateEvent {
    Progress {
        node: String,
        status: ProgressStatus,
    },
    Result {
        node: String,
        value: Value,
    },
    Failure {
        node: String,
        kind: ErrorKind,
        message: String,
    },
    Completed {
        value: Value,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl UpdateEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdateEvent::Completed { .. } | UpdateEvent::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskEventRecord {
    pub schema: String,
    pub task_id: String,
    pub seq: u64,
    pub event: UpdateEvent,
}

impl TaskEventRecord {
    pub fn new(task_id: impl Into<String>, seq: u64, event: UpdateEvent) -> Self {
        Self {
            schema: TASK_EVENT_SCHEMA.to_string(),
            task_id: task_id.into(),
            seq,
            event,
        }
    }
}

/// Stamps events with a task id and a contiguous sequence number.
#[derive(Debug, Clone)]
pub struct EventSequencer {
    task_id: String,
    next_seq: u64,
}

impl EventSequencer {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            next_seq: 0,
        }
    }

    pub fn next_record(&mut self, event: UpdateEvent) -> TaskEventRecord {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        TaskEventRecord::new(self.task_id.clone(), seq, event)
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("event sequence is empty")]
    Empty,
    #[error("event sequence must start at 0, got {actual}")]
    InvalidStart { actual: u64 },
    #[error("event sequence breaks at index {index}: expected {expected}, got {actual}")]
    NonContiguous {
        index: usize,
        expected: u64,
        actual: u64,
    },
    #[error("event at index {index} follows a terminal event")]
    EventAfterTerminal { index: usize },
    #[error("event sequence has no terminal event")]
    MissingTerminal,
}

/// Checks the exactly-once shape of a recorded stream: sequence numbers
/// are contiguous from 0 and the single terminal event comes last.
pub fn ensure_contiguous(records: &[TaskEventRecord]) -> Result<(), SequenceError> {
    let Some(first) = records.first() else {
        return Err(SequenceError::Empty);
    };
    if first.seq != 0 {
        return Err(SequenceError::InvalidStart { actual: first.seq });
    }
    let mut terminal_seen = first.event.is_terminal();
    for index in 1..records.len() {
        if terminal_seen {
            return Err(SequenceError::EventAfterTerminal { index });
        }
        let expected = records[index - 1].seq + 1;
        let actual = records[index].seq;
        if actual != expected {
            return Err(SequenceError::NonContiguous {
                index,
                expected,
                actual,
            });
        }
        terminal_seen = records[index].event.is_terminal();
    }
    if !terminal_seen {
        return Err(SequenceError::MissingTerminal);
    }
    Ok(())
}

pub fn encode_event_jsonl_line(record: &TaskEventRecord) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

pub fn parse_event_jsonl_line(line: &str) -> serde_json::Result<TaskEventRecord> {
    serde_json::from_str::<TaskEventRecord>(line.trim_end())
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
