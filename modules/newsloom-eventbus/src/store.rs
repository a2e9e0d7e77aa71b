//! EventBus — durable work-queue bus backed by Postgres.
//!
//! Generalizes a flat append-only fact log into two work-queue streams
//! (`articles.*`, `briefing.*`) with named durable pull consumers:
//! at-least-once delivery, explicit ack/nack, and visibility-timeout
//! redelivery if a consumer crashes mid-handler.

use std::time::Duration;

use sqlx::PgPool;
use tracing::warn;

use crate::error::EventBusError;
use crate::types::{retention_for, AppendEvent, StoredEvent};

type Result<T> = std::result::Result<T, EventBusError>;

/// Visibility timeout: how long a pulled-but-unacked message stays hidden
/// from other pulls before it's considered abandoned and redelivered.
const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct EventBus {
    pool: PgPool,
}

impl EventBus {
    /// Connect with exponential backoff.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let mut delay = Duration::from_millis(250);
        let mut last_err = None;
        for _ in 0..6 {
            match PgPool::connect(database_url).await {
                Ok(pool) => return Ok(Self { pool }),
                Err(e) => {
                    warn!(error = %e, delay_ms = delay.as_millis(), "event bus connect failed, retrying");
                    last_err = Some(e);
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(30));
                }
            }
        }
        Err(EventBusError::Connect(last_err.expect("at least one attempt was made")))
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Publish a JSON event onto the bus. At-least-once: readers pull it
    /// until acked.
    pub async fn publish(&self, event: AppendEvent) -> Result<StoredEvent> {
        let stored = sqlx::query_as::<_, StoredEvent>(
            r#"
            INSERT INTO bus_events (subject, parent_seq, caused_by_seq, run_id, actor, payload, schema_v)
            VALUES ($1, NULL, NULL, $2, $3, $4, $5)
            RETURNING seq, ts, subject, parent_seq, caused_by_seq, run_id, actor, payload, schema_v,
                      delivered_to, delivery_attempts
            "#,
        )
        .bind(&event.subject)
        .bind(&event.run_id)
        .bind(&event.actor)
        .bind(&event.payload)
        .bind(event.schema_v)
        .fetch_one(&self.pool)
        .await?;

        notify_new_event(&self.pool, stored.seq).await;
        Ok(stored)
    }

    /// Attach a durable pull consumer. `name` is a fixed identifier (e.g.
    /// `"processor"`) so redelivery resumes across restarts — the consumer
    /// carries no in-memory cursor, all state lives in `bus_events`.
    pub fn consumer(&self, name: impl Into<String>, subject_prefix: impl Into<String>) -> Consumer {
        Consumer {
            bus: self.clone(),
            name: name.into(),
            subject_prefix: subject_prefix.into(),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }

    /// Delete events that are either fully acked or have aged past their
    /// stream's retention window, regardless of ack state. Call
    /// periodically (e.g. once per ingestion cycle).
    pub async fn prune_expired(&self) -> Result<u64> {
        let mut total = 0u64;
        for stream in ["articles", "briefing"] {
            let max_age = retention_for(&format!("{stream}.x"));
            let cutoff = chrono::Utc::now() - chrono::Duration::from_std(max_age).unwrap_or_default();
            let result = sqlx::query(
                r#"
                DELETE FROM bus_events
                WHERE subject LIKE $1
                  AND (acked_at IS NOT NULL OR ts < $2)
                "#,
            )
            .bind(format!("{stream}.%"))
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
            total += result.rows_affected();
        }
        Ok(total)
    }
}

/// A durable pull consumer bound to a fixed name and subject prefix.
/// Create once per worker role and reuse across cycles/restarts.
#[derive(Clone)]
pub struct Consumer {
    bus: EventBus,
    name: String,
    subject_prefix: String,
    visibility_timeout: Duration,
}

impl Consumer {
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Claim up to `limit` unacked, currently-visible events for this
    /// consumer name, marking them delivered with a fresh visibility
    /// deadline. Uses `FOR UPDATE SKIP LOCKED` so concurrent consumer
    /// instances under the same name never double-claim a row.
    pub async fn pull(&self, limit: i64) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            WITH claimed AS (
                SELECT seq FROM bus_events
                WHERE subject LIKE $1
                  AND acked_at IS NULL
                  AND (visible_at IS NULL OR visible_at <= now())
                ORDER BY seq ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE bus_events
            SET delivered_to = $3,
                visible_at = now() + $4::interval,
                delivery_attempts = delivery_attempts + 1
            WHERE seq IN (SELECT seq FROM claimed)
            RETURNING seq, ts, subject, parent_seq, caused_by_seq, run_id, actor, payload, schema_v,
                      delivered_to, delivery_attempts
            "#,
        )
        .bind(format!("{}%", self.subject_prefix))
        .bind(limit)
        .bind(&self.name)
        .bind(format!("{} seconds", self.visibility_timeout.as_secs()))
        .fetch_all(&self.bus.pool)
        .await?;

        Ok(rows)
    }

    /// Acknowledge successful handling. The event is eligible for pruning
    /// from then on.
    pub async fn ack(&self, seq: i64) -> Result<()> {
        sqlx::query("UPDATE bus_events SET acked_at = now() WHERE seq = $1 AND delivered_to = $2")
            .bind(seq)
            .bind(&self.name)
            .execute(&self.bus.pool)
            .await?;
        Ok(())
    }

    /// Negative-acknowledge: handler failed, make the event immediately
    /// eligible for redelivery.
    pub async fn nack(&self, seq: i64) -> Result<()> {
        sqlx::query("UPDATE bus_events SET visible_at = now() WHERE seq = $1 AND delivered_to = $2")
            .bind(seq)
            .bind(&self.name)
            .execute(&self.bus.pool)
            .await?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

async fn notify_new_event(pool: &PgPool, seq: i64) {
    let result = sqlx::query("SELECT pg_notify('bus_events', $1::text)")
        .bind(seq)
        .execute(pool)
        .await;

    if let Err(e) = result {
        warn!(error = %e, seq, "PG NOTIFY failed (non-fatal)");
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEvent {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(StoredEvent {
            seq: row.try_get("seq")?,
            ts: row.try_get("ts")?,
            subject: row.try_get("subject")?,
            parent_seq: row.try_get("parent_seq")?,
            caused_by_seq: row.try_get("caused_by_seq")?,
            run_id: row.try_get("run_id")?,
            actor: row.try_get("actor")?,
            payload: row.try_get("payload")?,
            schema_v: row.try_get("schema_v")?,
            delivered_to: row.try_get("delivered_to")?,
            delivery_attempts: row.try_get("delivery_attempts")?,
        })
    }
}

#[cfg(feature = "test-utils")]
impl EventBus {
    /// Read all events regardless of ack/delivery state (for tests).
    pub async fn read_all(&self) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT seq, ts, subject, parent_seq, caused_by_seq, run_id, actor, payload, schema_v,
                   delivered_to, delivery_attempts
            FROM bus_events
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
