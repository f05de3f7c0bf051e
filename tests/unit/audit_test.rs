//! Tests for audit sink

use chrono::Utc;

use cadence_scheduler::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        1,
        Some("alerts"),
        AuditAction::Failed,
        Utc::now(),
        Some("timeout".to_string()),
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0], event);
    assert_eq!(events[0].group.as_deref(), Some("alerts"));
    assert_eq!(events[0].action, AuditAction::Failed);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    for id in 1..=3 {
        sink.record(build_audit_event(id, None, AuditAction::Scheduled, Utc::now(), None));
    }

    let ids: Vec<_> = sink.events().iter().map(|e| e.task_id).collect();
    assert_eq!(ids, [2, 3]);
}

#[test]
fn test_events_for_filters_by_task() {
    let sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event(1, None, AuditAction::Scheduled, Utc::now(), None));
    sink.record(build_audit_event(2, None, AuditAction::Scheduled, Utc::now(), None));
    sink.record(build_audit_event(1, None, AuditAction::Started, Utc::now(), None));

    let actions: Vec<_> = sink.events_for(1).iter().map(|e| e.action).collect();
    assert_eq!(actions, [AuditAction::Scheduled, AuditAction::Started]);
}

#[test]
fn test_event_serializes_action_snake_case() {
    let event = build_audit_event(5, None, AuditAction::Purged, Utc::now(), None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "purged");
    assert_eq!(json["task_id"], 5);
}
