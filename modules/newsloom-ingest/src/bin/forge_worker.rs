use anyhow::Result;
use newsloom_common::config::{optional_env, required_env};
use newsloom_ingest::{config, workers::forge, Config, WorkerContext};
use tracing_subscriber::EnvFilter;

const DEFAULT_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let ctx = WorkerContext::new(&config).await?;
    tracing::info!("forge-worker starting");

    let api_base_url = optional_env("FORGE_API_BASE_URL", "https://api.github.com");
    let token = required_env("FORGE_TOKEN");

    if config.once {
        forge::run_once(&ctx, &api_base_url, &token).await?;
        return Ok(());
    }

    let interval = config::fetch_interval(DEFAULT_INTERVAL_SECS);
    let mut shutdown = Box::pin(tokio::signal::ctrl_c());
    loop {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("ingestion_cycle", cycle_id, worker = "forge");
        let _enter = span.enter();

        if let Err(e) = forge::run_once(&ctx, &api_base_url, &token).await {
            tracing::error!(error = %e, "forge cycle failed");
        }
        drop(_enter);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = &mut shutdown => {
                tracing::info!("forge-worker received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}
