//! Integration tests for the durable work-queue bus.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use newsloom_eventbus::{AppendEvent, EventBus};
use serde_json::json;
use sqlx::PgPool;

/// Get a test database pool, or skip if no test DB is available.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bus_events (
            seq BIGSERIAL PRIMARY KEY,
            ts TIMESTAMPTZ NOT NULL DEFAULT now(),
            subject TEXT NOT NULL,
            parent_seq BIGINT,
            caused_by_seq BIGINT,
            run_id TEXT,
            actor TEXT,
            payload JSONB NOT NULL,
            schema_v SMALLINT NOT NULL DEFAULT 1,
            delivered_to TEXT,
            delivery_attempts INTEGER NOT NULL DEFAULT 0,
            visible_at TIMESTAMPTZ,
            acked_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(&pool)
    .await
    .ok()?;

    sqlx::query("TRUNCATE bus_events RESTART IDENTITY CASCADE").execute(&pool).await.ok()?;

    Some(pool)
}

// =========================================================================
// Basic publish/pull/ack/nack behavior
// =========================================================================

#[tokio::test]
async fn publish_returns_stored_event_with_seq() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    let stored = bus.publish(AppendEvent::new("articles.new", json!({"article_id": "a"}))).await.unwrap();
    assert!(stored.seq > 0);
    assert_eq!(stored.subject, "articles.new");
}

#[tokio::test]
async fn durable_consumer_pulls_published_events() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("articles.new", json!({"article_id": "a"}))).await.unwrap();
    bus.publish(AppendEvent::new("articles.new", json!({"article_id": "b"}))).await.unwrap();
    bus.publish(AppendEvent::new("briefing.generate", json!({}))).await.unwrap();

    let consumer = bus.consumer("processor", "articles.");
    let pulled = consumer.pull(10).await.unwrap();

    assert_eq!(pulled.len(), 2);
    assert!(pulled.iter().all(|e| e.subject.starts_with("articles.")));
}

#[tokio::test]
async fn acked_events_are_not_redelivered() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("articles.new", json!({}))).await.unwrap();

    let consumer = bus.consumer("processor", "articles.");
    let first_pull = consumer.pull(10).await.unwrap();
    assert_eq!(first_pull.len(), 1);
    consumer.ack(first_pull[0].seq).await.unwrap();

    // Still within the visibility window, but acked — must not reappear.
    let second_pull = consumer.pull(10).await.unwrap();
    assert!(second_pull.is_empty());
}

#[tokio::test]
async fn nacked_event_is_immediately_redeliverable() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("articles.new", json!({}))).await.unwrap();

    let consumer = bus.consumer("processor", "articles.");
    let first_pull = consumer.pull(10).await.unwrap();
    assert_eq!(first_pull.len(), 1);
    consumer.nack(first_pull[0].seq).await.unwrap();

    let redelivered = consumer.pull(10).await.unwrap();
    assert_eq!(redelivered.len(), 1);
    assert_eq!(redelivered[0].seq, first_pull[0].seq);
    assert_eq!(redelivered[0].delivery_attempts, 2);
}

#[tokio::test]
async fn unacked_event_hides_until_visibility_timeout_elapses() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("articles.new", json!({}))).await.unwrap();

    let consumer = bus.consumer("processor", "articles.").with_visibility_timeout(std::time::Duration::from_secs(60));
    let first_pull = consumer.pull(10).await.unwrap();
    assert_eq!(first_pull.len(), 1);

    // A second consumer instance under the same durable name must not
    // double-claim the still-invisible row.
    let second_pull = consumer.pull(10).await.unwrap();
    assert!(second_pull.is_empty());
}

#[tokio::test]
async fn pull_respects_limit() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    for i in 0..5 {
        bus.publish(AppendEvent::new("articles.new", json!({"i": i}))).await.unwrap();
    }

    let consumer = bus.consumer("processor", "articles.");
    let pulled = consumer.pull(3).await.unwrap();
    assert_eq!(pulled.len(), 3);
}

#[tokio::test]
async fn claimed_event_is_invisible_to_a_second_consumer_name() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("articles.new", json!({}))).await.unwrap();

    let processor = bus.consumer("processor", "articles.");
    let other = bus.consumer("other", "articles.");

    assert_eq!(processor.pull(10).await.unwrap().len(), 1);
    // Delivery state is per-event, not per-consumer-name: once claimed and
    // still within its visibility window, no other durable consumer can
    // also claim it (single logical work-queue reader per stream).
    assert!(other.pull(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn subject_prefix_filters_unrelated_streams() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("briefing.generate", json!({}))).await.unwrap();

    let consumer = bus.consumer("processor", "articles.");
    assert!(consumer.pull(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn prune_expired_removes_acked_events() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("articles.new", json!({}))).await.unwrap();
    let consumer = bus.consumer("processor", "articles.");
    let pulled = consumer.pull(10).await.unwrap();
    consumer.ack(pulled[0].seq).await.unwrap();

    let removed = bus.prune_expired().await.unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn prune_expired_leaves_unacked_recent_events() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(AppendEvent::new("articles.new", json!({}))).await.unwrap();

    let removed = bus.prune_expired().await.unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn payload_roundtrips_through_publish_and_pull() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    let payload = json!({
        "article_id": "550e8400-e29b-41d4-a716-446655440000",
        "nested": {"a": [1, 2, 3], "b": null},
    });
    bus.publish(AppendEvent::new("articles.new", payload.clone())).await.unwrap();

    let consumer = bus.consumer("processor", "articles.");
    let pulled = consumer.pull(10).await.unwrap();
    assert_eq!(pulled[0].payload, payload);
}

#[tokio::test]
async fn run_id_and_actor_persist() {
    let Some(pool) = test_pool().await else { return };
    let bus = EventBus::new(pool);

    bus.publish(
        AppendEvent::new("briefing.generate", json!({})).with_run_id("cycle-42").with_actor("composer"),
    )
    .await
    .unwrap();

    let consumer = bus.consumer("composer", "briefing.");
    let pulled = consumer.pull(10).await.unwrap();
    assert_eq!(pulled[0].run_id.as_deref(), Some("cycle-42"));
    assert_eq!(pulled[0].actor.as_deref(), Some("composer"));
}
