//! Forge (e.g. GitHub-style) release worker: bearer-token
//! REST endpoint, no content extraction — the release body itself is the
//! content.

use newsloom_common::SourceType;
use newsloom_store::ArticleFilter;
use serde::Deserialize;
use serde_json::json;

use crate::workers::{insert_and_publish, presettable_section};
use crate::{IngestError, WorkerContext};

const RELEASES_PER_REPO: u32 = 5;

#[derive(Deserialize)]
struct Release {
    tag_name: String,
    name: Option<String>,
    body: Option<String>,
    html_url: String,
    draft: bool,
    prerelease: bool,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    author: Option<Author>,
}

#[derive(Deserialize)]
struct Author {
    login: String,
}

pub async fn run_once(ctx: &WorkerContext, api_base_url: &str, token: &str) -> Result<(), IngestError> {
    let sources = ctx.store.list_enabled_sources_by_type(SourceType::ForgeReleases).await?;
    tracing::info!(count = sources.len(), "forge: polling sources");

    for source in sources {
        match fetch_source(ctx, &source, api_base_url, token).await {
            Ok(inserted) => {
                tracing::info!(source = %source.name, inserted, "forge: source fetched");
                ctx.store.update_source_fetch_status(source.id, None).await?;
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "forge: source fetch failed");
                ctx.store
                    .update_source_fetch_status(source.id, Some(&e.source_message()))
                    .await?;
            }
        }
    }
    Ok(())
}

async fn fetch_source(
    ctx: &WorkerContext,
    source: &newsloom_common::Source,
    api_base_url: &str,
    token: &str,
) -> Result<usize, IngestError> {
    let owner_repo = source
        .config
        .get("owner_repo")
        .and_then(|v| v.as_str())
        .ok_or_else(|| IngestError::FeedParse("missing config.owner_repo".into()))?;

    let url = format!("{api_base_url}/repos/{owner_repo}/releases?per_page={RELEASES_PER_REPO}");
    let response = ctx.transport.get_with_bearer(&url, token).await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IngestError::Upstream { status: status.as_u16(), body });
    }
    let releases: Vec<Release> = response.json().await?;

    let section_id = presettable_section(ctx, source).await;
    let mut inserted = 0usize;

    for release in releases {
        if release.draft || release.tag_name.is_empty() {
            continue;
        }

        let source_id = format!("{owner_repo}:{}", release.tag_name);
        let title = release.name.clone().unwrap_or_else(|| release.tag_name.clone());

        let metadata = json!({
            "source_name": owner_repo,
            "source_ref": source.id,
            "repo": owner_repo,
            "tag": release.tag_name,
            "prerelease": release.prerelease,
        });

        let filter = ArticleFilter {
            source_type: SourceType::ForgeReleases,
            source_id: &source_id,
            section_id,
            url: &release.html_url,
            title: &title,
            content: release.body.as_deref(),
            author: release.author.as_ref().map(|a| a.login.as_str()),
            published_at: release.published_at,
            metadata,
        };

        if insert_and_publish(ctx, filter).await?.is_some() {
            inserted += 1;
        }
    }

    Ok(inserted)
}
