use std::sync::Arc;

use anyhow::Result;
use newsloom_embed::EmbeddingClient;
use newsloom_eventbus::EventBus;
use newsloom_processor::{config::Config, Processor};
use newsloom_relevance::RelevanceEngine;
use newsloom_store::Store;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

const PRUNE_EVERY_N_CYCLES: u32 = 50;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;
    let bus = EventBus::connect(&config.database_url).await?;
    let embed = EmbeddingClient::new(config.embedding_service_url.clone());

    let relevance = RelevanceEngine::init(
        store.clone(),
        embed,
        config.threshold_config,
        config.source_boost_map(),
    )
    .await?;

    let processor = Processor::new(store, bus, relevance);
    let consumer = processor.consumer();

    tracing::info!("processor starting");

    if config.once {
        let handled = processor.run_cycle(&consumer).await?;
        tracing::info!(handled, "processor: one-shot cycle complete");
        return Ok(());
    }

    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("processor received shutdown signal");
        shutdown_signal.notify_waiters();
    });

    let idle_interval = std::time::Duration::from_secs(config.idle_poll_interval_secs);
    let mut cycle_count = 0u32;

    loop {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("processor_cycle", cycle_id);
        let _enter = span.enter();

        let handled = match processor.run_cycle(&consumer).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "processor cycle failed");
                0
            }
        };

        cycle_count = cycle_count.wrapping_add(1);
        if cycle_count % PRUNE_EVERY_N_CYCLES == 0 {
            if let Err(e) = processor.prune_expired_events().await {
                tracing::warn!(error = %e, "event bus pruning failed");
            }
        }

        drop(_enter);

        if handled == 0 {
            tokio::select! {
                _ = tokio::time::sleep(idle_interval) => {},
                _ = shutdown.notified() => break,
            }
        }
    }

    Ok(())
}
