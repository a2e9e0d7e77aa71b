use std::str::FromStr;

use anyhow::Result;
use cron::Schedule;
use newsloom_compose::{config::Config, BriefingComposer, ComposeError};
use newsloom_store::Store;
use tracing_subscriber::EnvFilter;

/// Per-cycle ceiling so a stuck LLM call can't wedge the daemon forever
///.
const CYCLE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;
    let llm = newsloom_llm::provider_from_parts(
        &config.llm_provider,
        config.llm_api_key.clone(),
        config.llm_model.clone(),
        config.llm_endpoint.clone(),
    )?;

    let composer = BriefingComposer::new(
        store,
        llm,
        config.threshold_default,
        config.threshold_min,
        config.threshold_max,
    );

    tracing::info!("compose starting");

    if config.once {
        run_cycle(&composer).await;
        return Ok(());
    }

    let schedule = Schedule::from_str(&config.schedule)
        .map_err(|e| ComposeError::BadSchedule(config.schedule.clone(), e.to_string()))?;

    let mut shutdown = Box::pin(tokio::signal::ctrl_c());
    loop {
        let Some(next) = schedule.upcoming(chrono::Utc).next() else {
            tracing::error!("briefing schedule has no further occurrences, shutting down");
            break;
        };
        let wait = (next - chrono::Utc::now()).to_std().unwrap_or(std::time::Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {},
            _ = &mut shutdown => {
                tracing::info!("compose received shutdown signal");
                break;
            }
        }

        run_cycle(&composer).await;
    }

    Ok(())
}

async fn run_cycle(composer: &BriefingComposer) {
    let cycle_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("briefing_cycle", cycle_id);
    let _enter = span.enter();

    match tokio::time::timeout(CYCLE_TIMEOUT, composer.run_once()).await {
        Ok(Ok(briefing)) => {
            tracing::info!(briefing_id = %briefing.id, "briefing composed");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "briefing cycle failed");
        }
        Err(_) => {
            tracing::error!("briefing cycle timed out");
        }
    }
}
