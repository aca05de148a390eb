use super::{
    encode_event_jsonl_line, ensure_contiguous, parse_event_jsonl_line, ErrorKind, EventSequencer,
    ProgressStatus, SequenceError, TaskEventRecord, UpdateEvent,
};
use serde_json::json;

fn progress(node: &str) -> UpdateEvent {
    UpdateEvent::Progress {
        node: node.to_string(),
        status: ProgressStatus::Started,
    }
}

fn completed() -> UpdateEvent {
    UpdateEvent::Completed { value: json!(null) }
}

#[test]
fn event_wire_tags() {
    let encoded = serde_json::to_value(UpdateEvent::Failure {
        node: "billing".to_string(),
        kind: ErrorKind::ServiceExecution,
        message: "boom".to_string(),
    })
    .expect("must encode");
    assert_eq!(
        encoded,
        json!({"event": "failure", "node": "billing", "kind": "service_execution", "message": "boom"})
    );
}

#[test]
fn terminal_detection() {
    assert!(completed().is_terminal());
    assert!(UpdateEvent::Failed {
        kind: ErrorKind::Transport,
        message: "gone".to_string()
    }
    .is_terminal());
    assert!(!progress("a").is_terminal());
}

#[test]
fn sequencer_stamps_contiguous_records() {
    let mut sequencer = EventSequencer::new("task-1");
    let records = vec![
        sequencer.next_record(progress("a")),
        sequencer.next_record(completed()),
    ];
    assert_eq!(records[0].seq, 0);
    assert_eq!(records[1].seq, 1);
    assert_eq!(sequencer.next_seq(), 2);
    assert_eq!(ensure_contiguous(&records), Ok(()));
}

#[test]
fn gap_in_sequence_is_detected() {
    let records = vec![
        TaskEventRecord::new("t", 0, progress("a")),
        TaskEventRecord::new("t", 2, completed()),
    ];
    assert_eq!(
        ensure_contiguous(&records),
        Err(SequenceError::NonContiguous {
            index: 1,
            expected: 1,
            actual: 2
        })
    );
}

#[test]
fn event_after_terminal_is_detected() {
    let records = vec![
        TaskEventRecord::new("t", 0, completed()),
        TaskEventRecord::new("t", 1, progress("late")),
    ];
    assert_eq!(
        ensure_contiguous(&records),
        Err(SequenceError::EventAfterTerminal { index: 1 })
    );
}

#[test]
fn missing_terminal_is_detected() {
    let records = vec![TaskEventRecord::new("t", 0, progress("a"))];
    assert_eq!(ensure_contiguous(&records), Err(SequenceError::MissingTerminal));
    assert_eq!(ensure_contiguous(&[]), Err(SequenceError::Empty));
}

#[test]
fn jsonl_round_trip() {
    let record = TaskEventRecord::new("task-9", 3, progress("fetch"));
    let line = encode_event_jsonl_line(&record).expect("must encode");
    assert!(line.ends_with('\n'));
    let parsed = parse_event_jsonl_line(&line).expect("must parse");
    assert_eq!(parsed, record);
}
