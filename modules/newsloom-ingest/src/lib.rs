//! Ingestion workers: four binaries sharing one
//! fetch → parse → dedup → persist → publish skeleton, one per source type.

pub mod config;
pub mod content;
pub mod error;
pub mod workers;

pub use config::Config;
pub use error::IngestError;

use std::sync::Arc;

use newsloom_cache::Cache;
use newsloom_dedup::DedupStore;
use newsloom_eventbus::EventBus;
use newsloom_ratelimit::{RateLimitedTransport, RateLimiter};
use newsloom_store::Store;

/// Dependencies every worker needs, assembled once in `main` and shared via
/// `Arc` across concurrent per-source fetches.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Store,
    pub bus: EventBus,
    pub dedup: DedupStore,
    pub transport: RateLimitedTransport,
}

impl WorkerContext {
    pub async fn new(config: &Config) -> Result<Self, IngestError> {
        let store = Store::connect(&config.database_url).await?;
        store.migrate().await?;
        let bus = EventBus::connect(&config.database_url).await?;

        let cache = Cache::connect(&config.redis_url).await?;
        let dedup = DedupStore::new(cache.clone());

        let limiter = RateLimiter::with_overrides(
            cache,
            &config.default_rate_spec,
            &config.rate_limit_overrides,
        )?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| IngestError::Init(e.to_string()))?;
        let transport = RateLimitedTransport::new(http, limiter, config.user_agent.clone());

        Ok(Self { store, bus, dedup, transport })
    }
}

pub type SharedContext = Arc<WorkerContext>;

/// Publish `articles.new` for a freshly created article, logging (but not
/// failing the run on) a publish error — the processor will still see it on
/// the next periodic `prune_expired` sweep of a retried pull in practice,
/// but a publish failure here means the event bus itself is down, which is
/// already surfaced via the worker's own error propagation at the call site.
pub async fn publish_new_article(
    bus: &EventBus,
    article_id: uuid::Uuid,
) -> Result<(), IngestError> {
    bus.publish(newsloom_eventbus::AppendEvent::new(
        "articles.new",
        serde_json::json!({ "article_id": article_id }),
    ))
    .await?;
    Ok(())
}
