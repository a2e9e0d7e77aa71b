use anyhow::Result;
use newsloom_ingest::{config, workers::aggregator, Config, WorkerContext};
use tracing_subscriber::EnvFilter;

const DEFAULT_INTERVAL_SECS: u64 = 15 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let ctx = WorkerContext::new(&config).await?;
    tracing::info!("aggregator-worker starting");

    if config.once {
        aggregator::run_once(&ctx).await?;
        return Ok(());
    }

    let interval = config::fetch_interval(DEFAULT_INTERVAL_SECS);
    let mut shutdown = Box::pin(tokio::signal::ctrl_c());
    loop {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("ingestion_cycle", cycle_id, worker = "aggregator");
        let _enter = span.enter();

        if let Err(e) = aggregator::run_once(&ctx).await {
            tracing::error!(error = %e, "aggregator cycle failed");
        }
        drop(_enter);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = &mut shutdown => {
                tracing::info!("aggregator-worker received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}
