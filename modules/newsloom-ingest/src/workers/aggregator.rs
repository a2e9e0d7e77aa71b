//! Hacker-News-like social aggregator worker. Talks to a
//! public read-only firebase-style API: list endpoints return arrays of
//! numeric ids, item endpoints return a single JSON object per id.

use std::collections::HashSet;

use newsloom_common::SourceType;
use newsloom_dedup::{canonicalize_url, hash_url};
use newsloom_store::ArticleFilter;
use serde::Deserialize;
use serde_json::json;

use crate::content::{extract_readable_text, strip_html};
use crate::workers::{insert_and_publish, presettable_section};
use crate::{IngestError, WorkerContext};

const DEFAULT_MIN_SCORE: i64 = 10;
const LISTS: [&str; 3] = ["topstories", "beststories", "newstories"];

#[derive(Deserialize)]
struct Item {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    descendants: Option<i64>,
    #[serde(default)]
    time: Option<i64>,
    #[serde(rename = "type", default)]
    item_type: Option<String>,
}

pub async fn run_once(ctx: &WorkerContext) -> Result<(), IngestError> {
    let sources = ctx.store.list_enabled_sources_by_type(SourceType::SocialAggregator).await?;
    tracing::info!(count = sources.len(), "aggregator: polling sources");

    for source in sources {
        match fetch_source(ctx, &source).await {
            Ok(inserted) => {
                tracing::info!(source = %source.name, inserted, "aggregator: source fetched");
                ctx.store.update_source_fetch_status(source.id, None).await?;
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "aggregator: source fetch failed");
                ctx.store
                    .update_source_fetch_status(source.id, Some(&e.source_message()))
                    .await?;
            }
        }
    }
    Ok(())
}

async fn fetch_source(ctx: &WorkerContext, source: &newsloom_common::Source) -> Result<usize, IngestError> {
    let base_url = source
        .config
        .get("api_base_url")
        .and_then(|v| v.as_str())
        .unwrap_or("https://hacker-news.firebaseio.com/v0")
        .to_string();
    let min_score = source
        .config
        .get("min_score")
        .and_then(|v| v.as_i64())
        .unwrap_or(DEFAULT_MIN_SCORE);

    let mut ids: Vec<i64> = Vec::new();
    let mut seen_ids = HashSet::new();
    for list in LISTS {
        let url = format!("{base_url}/{list}.json");
        let response = ctx.transport.get(&url).await?;
        if !response.status().is_success() {
            continue;
        }
        let list_ids: Vec<i64> = response.json().await?;
        for id in list_ids {
            if seen_ids.insert(id) {
                ids.push(id);
            }
        }
    }

    let section_id = presettable_section(ctx, source).await;
    let mut inserted = 0usize;

    for id in ids {
        let item_url = format!("{base_url}/item/{id}.json");
        let response = match ctx.transport.get(&item_url).await {
            Ok(r) if r.status().is_success() => r,
            _ => continue,
        };
        let Ok(item) = response.json::<Item>().await else { continue };

        if item.item_type.as_deref() != Some("story") {
            continue;
        }
        if item.score.unwrap_or(0) <= min_score {
            continue;
        }

        let item_page_url = format!("https://news.ycombinator.com/item?id={id}");
        let external_url = item.url.clone().unwrap_or_else(|| item_page_url.clone());
        let canonical_url = canonicalize_url(&external_url);
        let url_hash = hash_url(&external_url);

        if !ctx.dedup.is_new(&external_url).await? {
            continue;
        }

        let content = if item.url.is_some() {
            extract_content(ctx, &external_url).await
        } else {
            item.text.as_deref().map(strip_html)
        };

        let published_at = item
            .time
            .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
            .map(|dt| dt.with_timezone(&chrono::Utc));

        let metadata = json!({
            "source_name": source.name,
            "source_ref": source.id,
            "canonical_url": canonical_url,
            "url_hash": url_hash,
            "aggregator_score": item.score.unwrap_or(0),
            "comment_count": item.descendants.unwrap_or(0),
            "item_id": id,
            "item_type": item.item_type,
        });

        let filter = ArticleFilter {
            source_type: SourceType::SocialAggregator,
            source_id: &id.to_string(),
            section_id,
            url: &canonical_url,
            title: item.title.as_deref().unwrap_or(&item_page_url),
            content: content.as_deref(),
            author: item.by.as_deref(),
            published_at,
            metadata,
        };

        if insert_and_publish(ctx, filter).await?.is_some() {
            inserted += 1;
        }
    }

    Ok(inserted)
}

async fn extract_content(ctx: &WorkerContext, url: &str) -> Option<String> {
    let response = ctx.transport.get_content(url).await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;
    extract_readable_text(&body)
}
