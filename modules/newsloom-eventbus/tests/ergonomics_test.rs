//! Ergonomics and usage pattern tests.
//! These don't need Postgres — they test the API surface and developer experience.

use newsloom_eventbus::{retention_for, stream_of, AppendEvent, StoredEvent};
use serde_json::json;
use std::time::Duration;

// =========================================================================
// AppendEvent builder ergonomics
// =========================================================================

#[test]
fn append_event_minimal_construction() {
    let event = AppendEvent::new("articles.new", json!({"article_id": "abc"}));
    assert_eq!(event.subject, "articles.new");
    assert!(event.run_id.is_none());
    assert!(event.actor.is_none());
    assert_eq!(event.schema_v, 1);
}

#[test]
fn append_event_full_builder_chain() {
    let event = AppendEvent::new("briefing.generate", json!({"cycle": 1}))
        .with_run_id("run-abc-123")
        .with_actor("composer")
        .with_schema_v(2);

    assert_eq!(event.subject, "briefing.generate");
    assert_eq!(event.run_id.as_deref(), Some("run-abc-123"));
    assert_eq!(event.actor.as_deref(), Some("composer"));
    assert_eq!(event.schema_v, 2);
}

#[test]
fn append_event_builder_order_doesnt_matter() {
    let a = AppendEvent::new("articles.new", json!({})).with_run_id("run").with_actor("ingest");
    let b = AppendEvent::new("articles.new", json!({})).with_actor("ingest").with_run_id("run");

    assert_eq!(a.run_id, b.run_id);
    assert_eq!(a.actor, b.actor);
}

#[test]
fn stored_event_is_serializable() {
    // StoredEvent can be serialized for debugging, logging, admin UI.
    let stored = StoredEvent {
        seq: 42,
        ts: chrono::Utc::now(),
        subject: "articles.new".to_string(),
        parent_seq: None,
        caused_by_seq: None,
        run_id: Some("run-123".to_string()),
        actor: Some("ingest".to_string()),
        payload: json!({"article_id": "xyz"}),
        schema_v: 1,
        delivered_to: None,
        delivery_attempts: 0,
    };

    let json = serde_json::to_string(&stored).unwrap();
    assert!(json.contains("articles.new"));
    assert!(json.contains("42"));

    let roundtripped: StoredEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(roundtripped.seq, 42);
    assert_eq!(roundtripped.subject, "articles.new");
}

// =========================================================================
// Retention / stream derivation
// =========================================================================

#[test]
fn articles_stream_retains_72h() {
    assert_eq!(retention_for("articles.new"), Duration::from_secs(72 * 3600));
    assert_eq!(retention_for("articles.processed"), Duration::from_secs(72 * 3600));
}

#[test]
fn briefing_stream_retains_24h() {
    assert_eq!(retention_for("briefing.generate"), Duration::from_secs(24 * 3600));
}

#[test]
fn stream_of_strips_suffix() {
    assert_eq!(stream_of("articles.new"), "articles");
    assert_eq!(stream_of("briefing.generate"), "briefing");
}
