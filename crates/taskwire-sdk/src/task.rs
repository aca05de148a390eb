use futures::future::LocalBoxFuture;
use futures::stream::{self, LocalBoxStream, Stream, StreamExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use taskwire_core::Template;

use crate::events::{ErrorKind, UpdateEvent};
use crate::serialize;

/// Free-form metadata attached to a run, opaque to the plan.
pub type TaskMeta = BTreeMap<String, Value>;

/// Everything the operator receives for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub template: Value,
    pub digest: String,
    pub meta: TaskMeta,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The seam to the operator. Submitting yields the run's event stream;
/// everything network-shaped lives behind this trait.
pub trait Connection {
    fn submit(
        &self,
        submission: Submission,
    ) -> LocalBoxFuture<'_, Result<LocalBoxStream<'static, UpdateEvent>, TransportError>>;
}

/// Client-side factory. Owns the one connection all its tasks share.
pub struct Producer<C: Connection> {
    connection: Rc<C>,
}

impl<C: Connection> Producer<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection: Rc::new(connection),
        }
    }

    /// Binds a template to a run. The template is serialized and digested
    /// once, here; it is already valid by construction.
    pub fn task(&self, template: &Template) -> serde_json::Result<Task<C>> {
        let encoded = serialize::template_to_value(template)?;
        let digest = serialize::template_digest_hex(template)?;
        Ok(Task {
            connection: Rc::clone(&self.connection),
            template: encoded,
            digest,
            meta: TaskMeta::new(),
            input: Value::Null,
        })
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Completed { value: Value },
    Failed { kind: ErrorKind, message: String },
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. })
    }

    fn from_terminal(event: &UpdateEvent) -> Option<Self> {
        match event {
            UpdateEvent::Completed { value } => Some(TaskOutcome::Completed {
                value: value.clone(),
            }),
            UpdateEvent::Failed { kind, message } => Some(TaskOutcome::Failed {
                kind: *kind,
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

/// One submission of a template, bound to its input and metadata.
pub struct Task<C: Connection> {
    connection: Rc<C>,
    template: Value,
    digest: String,
    meta: TaskMeta,
    input: Value,
}

impl<C: Connection> Task<C> {
    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.meta.insert(key.to_string(), value);
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Submits and drives the stream, handing every event to `on_update`
    /// in emission order. Resolves on the first terminal event. Transport
    /// failures arrive as a terminal `Failed` event, never as an early
    /// return.
    pub async fn run_with<F>(self, mut on_update: F) -> TaskOutcome
    where
        F: FnMut(&UpdateEvent),
    {
        let mut execution = self.run().await;
        while let Some(event) = execution.next().await {
            on_update(&event);
        }
        execution.settle()
    }

    /// Submits and returns the execution handle: a one-shot stream of the
    /// run's events that can also be awaited for the terminal outcome.
    /// Events consumed through the stream are never replayed by
    /// [`TaskExecution::outcome`]; together they observe each event
    /// exactly once.
    pub async fn run(self) -> TaskExecution {
        tracing::debug!(digest = %self.digest, "submitting task");
        let submission = Submission {
            template: self.template,
            digest: self.digest,
            meta: self.meta,
            input: self.input,
        };
        let inner = match self.connection.submit(submission).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::debug!(error = %err, "task submission failed");
                let event = UpdateEvent::Failed {
                    kind: ErrorKind::Transport,
                    message: err.to_string(),
                };
                stream::iter(vec![event]).boxed_local()
            }
        };
        TaskExecution {
            inner,
            outcome: None,
            done: false,
        }
    }
}

/// A running task. Yields the run's events lazily, once, front to back;
/// ends right after the terminal event. [`TaskExecution::outcome`] drains
/// whatever was not pulled yet and returns how the run ended.
pub struct TaskExecution {
    inner: LocalBoxStream<'static, UpdateEvent>,
    outcome: Option<TaskOutcome>,
    done: bool,
}

impl TaskExecution {
    pub async fn outcome(mut self) -> TaskOutcome {
        while self.next().await.is_some() {}
        self.settle()
    }

    fn settle(&mut self) -> TaskOutcome {
        match self.outcome.take() {
            Some(outcome) => outcome,
            // Unreachable once the stream is drained; the missing-terminal
            // case is synthesized in poll_next.
            None => TaskOutcome::Failed {
                kind: ErrorKind::Transport,
                message: "event stream ended before a terminal event".to_string(),
            },
        }
    }
}

impl Stream for TaskExecution {
    type Item = UpdateEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<UpdateEvent>> {
        if self.done {
            return Poll::Ready(None);
        }
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(event)) => {
                if let Some(outcome) = TaskOutcome::from_terminal(&event) {
                    self.outcome = Some(outcome);
                    self.done = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                // The operator hung up without settling the run.
                let event = UpdateEvent::Failed {
                    kind: ErrorKind::Transport,
                    message: "event stream ended before a terminal event".to_string(),
                };
                self.outcome = TaskOutcome::from_terminal(&event);
                self.done = true;
                Poll::Ready(Some(event))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
#[path = "task_test.rs"]
mod tests;
