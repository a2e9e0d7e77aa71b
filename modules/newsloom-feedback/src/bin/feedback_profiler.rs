use anyhow::Result;
use newsloom_embed::EmbeddingClient;
use newsloom_feedback::{config::Config, FeedbackProfiler, TriggerMode};
use newsloom_store::Store;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;
    let embed = EmbeddingClient::new(config.embedding_service_url.clone());
    let profiler = FeedbackProfiler::new(store, embed);

    tracing::info!(mode = ?config.trigger_mode, "feedback-profiler starting");

    let profiles = profiler.recompute_all().await?;
    tracing::info!(sections = profiles.len(), "startup recomputation complete");

    if config.once || config.trigger_mode == TriggerMode::Immediate {
        // Immediate mode recomputes inline wherever feedback is created or
        // deleted, which lives outside this crate; this binary's job ends
        // with the startup pass.
        return Ok(());
    }

    let interval = std::time::Duration::from_secs(config.recompute_interval_secs);
    let mut shutdown = Box::pin(tokio::signal::ctrl_c());
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = &mut shutdown => {
                tracing::info!("feedback-profiler received shutdown signal");
                break;
            }
        }

        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("feedback_recompute_cycle", cycle_id);
        let _enter = span.enter();

        match profiler.recompute_all().await {
            Ok(profiles) => tracing::info!(sections = profiles.len(), "periodic recomputation complete"),
            Err(e) => tracing::error!(error = %e, "periodic recomputation failed"),
        }
    }

    Ok(())
}
