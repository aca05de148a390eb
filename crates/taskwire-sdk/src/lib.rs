pub mod builder;
pub mod events;
pub mod local;
pub mod serialize;
pub mod task;
pub mod validate;

pub use builder::TemplateBuilder;
pub use events::{
    encode_event_jsonl_line, ensure_contiguous, parse_event_jsonl_line, ErrorKind, EventSequencer,
    ProgressStatus, SequenceError, TaskEventRecord, UpdateEvent, TASK_EVENT_SCHEMA,
};
pub use local::LocalOperator;
pub use serialize::{
    template_digest_hex, template_from_str, template_from_value, template_to_json,
    template_to_value,
};
pub use task::{Connection, Producer, Submission, Task, TaskExecution, TaskMeta, TaskOutcome, TransportError};
pub use validate::{validate_template, ValidationError};
