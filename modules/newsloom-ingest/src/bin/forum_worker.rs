use std::sync::Arc;

use anyhow::Result;
use newsloom_common::config::{optional_env, required_env};
use newsloom_ingest::{config, workers::forum, workers::forum::ForumAuth, Config, WorkerContext};
use tracing_subscriber::EnvFilter;

const DEFAULT_INTERVAL_SECS: u64 = 30 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let ctx = WorkerContext::new(&config).await?;
    tracing::info!("forum-worker starting");

    let api_base_url = optional_env("FORUM_API_BASE_URL", "https://oauth.reddit.com");
    let token_url = required_env("FORUM_TOKEN_URL");
    let client_id = required_env("FORUM_CLIENT_ID");
    let client_secret = required_env("FORUM_CLIENT_SECRET");
    let username = required_env("FORUM_USERNAME");
    let password = required_env("FORUM_PASSWORD");

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let auth = Arc::new(ForumAuth::new(
        http,
        token_url,
        client_id,
        client_secret,
        username,
        password,
        config.user_agent.clone(),
    ));

    if config.once {
        forum::run_once(&ctx, auth, &api_base_url).await?;
        return Ok(());
    }

    let interval = config::fetch_interval(DEFAULT_INTERVAL_SECS);
    let mut shutdown = Box::pin(tokio::signal::ctrl_c());
    loop {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("ingestion_cycle", cycle_id, worker = "forum");
        let _enter = span.enter();

        if let Err(e) = forum::run_once(&ctx, auth.clone(), &api_base_url).await {
            tracing::error!(error = %e, "forum cycle failed");
        }
        drop(_enter);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = &mut shutdown => {
                tracing::info!("forum-worker received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}
