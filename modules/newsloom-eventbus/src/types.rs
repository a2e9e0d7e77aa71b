//! Core types for the durable work-queue bus. Domain-agnostic: subjects and
//! payloads are opaque strings/JSON, retention policy is keyed off the
//! subject's stream prefix (`articles.*`, `briefing.*`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Max age per stream before a message is eligible for pruning regardless
/// of ack state.
pub fn retention_for(subject: &str) -> Duration {
    match stream_of(subject) {
        "articles" => Duration::from_secs(72 * 3600),
        "briefing" => Duration::from_secs(24 * 3600),
        _ => Duration::from_secs(72 * 3600),
    }
}

/// The stream a subject belongs to, i.e. the part before the first dot.
pub fn stream_of(subject: &str) -> &str {
    subject.split('.').next().unwrap_or(subject)
}

/// An event as stored in Postgres. Returned by all read/pull methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub seq: i64,
    pub ts: DateTime<Utc>,
    pub subject: String,
    pub parent_seq: Option<i64>,
    pub caused_by_seq: Option<i64>,
    pub run_id: Option<String>,
    pub actor: Option<String>,
    pub payload: serde_json::Value,
    pub schema_v: i16,
    pub delivered_to: Option<String>,
    pub delivery_attempts: i32,
}

/// An event to be published. The caller builds this; the bus assigns
/// seq/ts.
#[derive(Debug, Clone)]
pub struct AppendEvent {
    pub subject: String,
    pub payload: serde_json::Value,
    pub run_id: Option<String>,
    pub actor: Option<String>,
    pub schema_v: i16,
}

impl AppendEvent {
    /// Create an event from anything that serializes to JSON. `subject`
    /// must be one of the fixed subjects (`articles.new`,
    /// `articles.processed`, `briefing.generate`, ...).
    pub fn new(subject: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            subject: subject.into(),
            payload,
            run_id: None,
            actor: None,
            schema_v: 1,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_schema_v(mut self, v: i16) -> Self {
        self.schema_v = v;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
}
