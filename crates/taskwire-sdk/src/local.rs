use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde_json::Value;
use std::collections::BTreeMap;
use taskwire_core::{FailurePolicy, Node, Template};

use crate::events::{ErrorKind, ProgressStatus, UpdateEvent};
use crate::serialize;
use crate::task::{Connection, Submission, TransportError};

/// A service implementation: receives the task input and the node's
/// configuration, produces a result value or a failure message.
pub type ServiceHandler = Box<dyn Fn(&Value, Option<&Value>) -> Result<Value, String>>;

/// An in-process operator. Executes submitted templates synchronously
/// against registered handlers with the documented plan semantics, so
/// runs are deterministic and the network stays out of the picture.
#[derive(Default)]
pub struct LocalOperator {
    handlers: BTreeMap<String, ServiceHandler>,
}

impl LocalOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&Value, Option<&Value>) -> Result<Value, String> + 'static,
    {
        self.handlers.insert(name.to_string(), Box::new(handler));
    }

    fn execute(&self, submission: Submission) -> Vec<UpdateEvent> {
        let template = match serialize::template_from_value(submission.template) {
            Ok(template) => template,
            Err(err) => {
                return vec![UpdateEvent::Failed {
                    kind: ErrorKind::ServiceExecution,
                    message: format!("rejected template: {err}"),
                }];
            }
        };
        tracing::debug!(digest = %submission.digest, "local operator accepted task");
        let execution = Execution {
            operator: self,
            input: submission.input,
            results: BTreeMap::new(),
            events: Vec::new(),
        };
        execution.run(&template)
    }
}

impl Connection for LocalOperator {
    fn submit(
        &self,
        submission: Submission,
    ) -> futures::future::LocalBoxFuture<
        '_,
        Result<futures::stream::LocalBoxStream<'static, UpdateEvent>, TransportError>,
    > {
        let events = self.execute(submission);
        async move { Ok(stream::iter(events).boxed_local()) }.boxed_local()
    }
}

struct Fatal {
    message: String,
}

struct Execution<'a> {
    operator: &'a LocalOperator,
    input: Value,
    results: BTreeMap<String, Value>,
    events: Vec<UpdateEvent>,
}

impl Execution<'_> {
    fn run(mut self, template: &Template) -> Vec<UpdateEvent> {
        let mut last = None;
        for (index, node) in template.nodes.iter().enumerate() {
            let path = format!("nodes[{index}]");
            match self.run_node(node, &path) {
                Ok(Some(value)) => last = Some(value),
                Ok(None) => {}
                Err(fatal) => {
                    self.events.push(UpdateEvent::Failed {
                        kind: ErrorKind::ServiceExecution,
                        message: fatal.message,
                    });
                    return self.events;
                }
            }
        }
        self.events.push(UpdateEvent::Completed {
            value: last.unwrap_or(Value::Null),
        });
        self.events
    }

    /// Runs one node to completion, returning the value it contributes
    /// to the enclosing scope, if any. `Err` is fatal to the whole task.
    fn run_node(&mut self, node: &Node, path: &str) -> Result<Option<Value>, Fatal> {
        match node {
            Node::Service {
                name,
                configuration,
                retry,
                on_failure,
                ..
            } => {
                // result_key is always present on a service node.
                let key = node.result_key().unwrap_or(name).to_string();
                self.events.push(UpdateEvent::Progress {
                    node: key.clone(),
                    status: ProgressStatus::Started,
                });
                let attempts = retry.map(|policy| policy.max_attempts.max(1)).unwrap_or(1);
                let mut failure = String::new();
                for attempt in 1..=attempts {
                    match self.invoke(name, configuration.as_ref()) {
                        Ok(value) => {
                            self.results.insert(key.clone(), value.clone());
                            self.events.push(UpdateEvent::Result {
                                node: key,
                                value: value.clone(),
                            });
                            return Ok(Some(value));
                        }
                        Err(message) => {
                            failure = message;
                            if attempt < attempts {
                                self.events.push(UpdateEvent::Progress {
                                    node: key.clone(),
                                    status: ProgressStatus::Retrying,
                                });
                            }
                        }
                    }
                }
                self.events.push(UpdateEvent::Failure {
                    node: key.clone(),
                    kind: ErrorKind::ServiceExecution,
                    message: failure.clone(),
                });
                match on_failure {
                    Some(FailurePolicy::Skip) => Ok(None),
                    Some(FailurePolicy::Branch { node: substitute }) => {
                        let substitute_path = format!("{path}.on_failure");
                        let value = self.run_node(substitute, &substitute_path)?;
                        if let Some(value) = &value {
                            // The substitute's outcome stands in for the
                            // failed node under its result key.
                            self.results.insert(key, value.clone());
                        }
                        Ok(value)
                    }
                    None => Err(Fatal {
                        message: format!("service `{key}` failed: {failure}"),
                    }),
                }
            }
            Node::Sequence { children } => {
                let mut last = None;
                for (index, child) in children.iter().enumerate() {
                    let child_path = format!("{path}.children[{index}]");
                    if let Some(value) = self.run_node(child, &child_path)? {
                        last = Some(value);
                    }
                }
                Ok(last)
            }
            Node::Parallel { children } => {
                // Branches run in listed order here; an unguarded failure
                // stops the group before later branches start.
                for (index, child) in children.iter().enumerate() {
                    let child_path = format!("{path}.children[{index}]");
                    self.run_node(child, &child_path)?;
                }
                Ok(None)
            }
            Node::Condition {
                expression,
                then_branch,
                else_branch,
            } => {
                let verdict = taskwire_expr::evaluate(expression, |key| self.results.get(key))
                    .map_err(|err| Fatal {
                        message: format!("condition at {path}: {err}"),
                    })?;
                if verdict {
                    let then_path = format!("{path}.then");
                    self.run_node(then_branch, &then_path)
                } else if let Some(else_branch) = else_branch {
                    let else_path = format!("{path}.else");
                    self.run_node(else_branch, &else_path)
                } else {
                    // False with no else branch: the subtree is skipped,
                    // not failed.
                    self.events.push(UpdateEvent::Progress {
                        node: path.to_string(),
                        status: ProgressStatus::Skipped,
                    });
                    Ok(None)
                }
            }
        }
    }

    fn invoke(&self, name: &str, configuration: Option<&Value>) -> Result<Value, String> {
        let Some(handler) = self.operator.handlers.get(name) else {
            return Err(format!("no handler registered for service `{name}`"));
        };
        handler(&self.input, configuration)
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
