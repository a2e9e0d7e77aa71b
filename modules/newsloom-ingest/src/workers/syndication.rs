//! RSS/Atom syndication worker.

use newsloom_common::SourceType;
use newsloom_dedup::{canonicalize_url, hash_url};
use newsloom_store::ArticleFilter;
use serde_json::json;

use crate::content::{extract_readable_text, strip_html};
use crate::workers::{insert_and_publish, presettable_section};
use crate::{IngestError, WorkerContext};

/// Run one pass over every enabled syndication source. Per-source failures
/// are logged and recorded on the source; they never abort the run
///.
pub async fn run_once(ctx: &WorkerContext) -> Result<(), IngestError> {
    let sources = ctx.store.list_enabled_sources_by_type(SourceType::Syndication).await?;
    tracing::info!(count = sources.len(), "syndication: polling sources");

    for source in sources {
        match fetch_source(ctx, &source).await {
            Ok(inserted) => {
                tracing::info!(source = %source.name, inserted, "syndication: source fetched");
                ctx.store.update_source_fetch_status(source.id, None).await?;
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "syndication: source fetch failed");
                ctx.store
                    .update_source_fetch_status(source.id, Some(&e.source_message()))
                    .await?;
            }
        }
    }
    Ok(())
}

async fn fetch_source(ctx: &WorkerContext, source: &newsloom_common::Source) -> Result<usize, IngestError> {
    let feed_url = source
        .config
        .get("feed_url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| IngestError::FeedParse("missing config.feed_url".into()))?;

    let response = ctx.transport.get(feed_url).await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IngestError::Upstream { status: status.as_u16(), body });
    }
    let bytes = response.bytes().await?;
    let feed = feed_rs::parser::parse(&bytes[..]).map_err(|e| IngestError::FeedParse(e.to_string()))?;

    let section_id = presettable_section(ctx, source).await;
    let mut inserted = 0usize;

    for entry in feed.entries {
        let Some(link) = entry.links.first().map(|l| l.href.clone()).or_else(|| {
            entry.id.starts_with("http").then(|| entry.id.clone())
        }) else {
            continue;
        };

        let canonical_url = canonicalize_url(&link);
        let url_hash = hash_url(&link);

        if !ctx.dedup.is_new(&link).await? {
            continue;
        }

        let title = entry.title.map(|t| t.content).unwrap_or_else(|| link.clone());
        let published_at = entry.published.or(entry.updated).map(|dt| dt.with_timezone(&chrono::Utc));
        let author = entry.authors.first().map(|a| a.name.clone());

        let content = match extract_content(ctx, &link).await {
            Some(text) => Some(text),
            None => entry
                .summary
                .map(|s| strip_html(&s.content))
                .or_else(|| entry.content.and_then(|c| c.body).map(|b| strip_html(&b))),
        };

        let metadata = json!({
            "source_name": source.name,
            "source_ref": source.id,
            "feed_url": feed_url,
            "canonical_url": canonical_url,
            "url_hash": url_hash,
            "guid": entry.id,
        });

        let filter = ArticleFilter {
            source_type: SourceType::Syndication,
            source_id: &entry.id,
            section_id,
            url: &canonical_url,
            title: &title,
            content: content.as_deref(),
            author: author.as_deref(),
            published_at,
            metadata,
        };

        if insert_and_publish(ctx, filter).await?.is_some() {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Best-effort readable-content extraction of the upstream article page,
/// rate-limited through the shared transport. `None` on any failure so the
/// caller falls back to the feed-provided description.
async fn extract_content(ctx: &WorkerContext, url: &str) -> Option<String> {
    let response = ctx.transport.get_content(url).await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;
    extract_readable_text(&body)
}
