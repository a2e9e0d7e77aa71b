//! Durable work-queue event bus.
//!
//! Two streams — `articles.*` (72h retention) and `briefing.*` (24h
//! retention) — with named durable pull consumers. Zero domain knowledge:
//! subjects and payloads are opaque; callers define their own event
//! shapes and serialize to `serde_json::Value`.

pub mod error;
pub mod store;
pub mod types;

pub use error::EventBusError;
pub use store::{Consumer, EventBus};
pub use types::{retention_for, stream_of, AppendEvent, StoredEvent};
