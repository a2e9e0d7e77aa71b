//! Subreddit-like social forum worker: OAuth2 password-grant
//! authentication with a cached token, per-subreddit listing fetch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use newsloom_common::SourceType;
use newsloom_dedup::{canonicalize_url, hash_url};
use newsloom_store::ArticleFilter;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::content::extract_readable_text;
use crate::workers::{insert_and_publish, presettable_section};
use crate::{IngestError, WorkerContext};

const DEFAULT_SORT: &str = "hot";
const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 100;
/// Refresh this far ahead of the token's reported expiry.
const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// OAuth2 password-grant client with a single cached token shared across a
/// worker run. On a `401` the caller invalidates and refreshes once
///.
pub struct ForumAuth {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    user_agent: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ForumAuth {
    pub fn new(
        http: reqwest::Client,
        token_url: String,
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
        user_agent: String,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id,
            client_secret,
            username,
            password,
            user_agent,
            cached: RwLock::new(None),
        }
    }

    pub async fn token(&self) -> Result<String, IngestError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }
        self.refresh().await
    }

    pub async fn invalidate_and_refresh(&self) -> Result<String, IngestError> {
        *self.cached.write().await = None;
        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, IngestError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", &self.username),
                ("password", &self.password),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Upstream { status, body });
        }

        let parsed: TokenResponse = response.json().await?;
        let expires_at =
            Instant::now() + Duration::from_secs(parsed.expires_in).saturating_sub(EXPIRY_SAFETY_MARGIN);

        let token = parsed.access_token.clone();
        *self.cached.write().await = Some(CachedToken { token: token.clone(), expires_at });
        Ok(token)
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    url: String,
    permalink: String,
    author: String,
    score: i64,
    num_comments: i64,
    stickied: bool,
    is_self: bool,
    subreddit: String,
    created_utc: f64,
}

pub async fn run_once(ctx: &WorkerContext, auth: Arc<ForumAuth>, api_base_url: &str) -> Result<(), IngestError> {
    let sources = ctx.store.list_enabled_sources_by_type(SourceType::SocialForum).await?;
    tracing::info!(count = sources.len(), "forum: polling sources");

    for source in sources {
        match fetch_source(ctx, &source, &auth, api_base_url).await {
            Ok(inserted) => {
                tracing::info!(source = %source.name, inserted, "forum: source fetched");
                ctx.store.update_source_fetch_status(source.id, None).await?;
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "forum: source fetch failed");
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
    auth: &ForumAuth,
    api_base_url: &str,
) -> Result<usize, IngestError> {
    let subreddit = source
        .config
        .get("subreddit")
        .and_then(|v| v.as_str())
        .ok_or_else(|| IngestError::FeedParse("missing config.subreddit".into()))?;
    let sort = source.config.get("sort").and_then(|v| v.as_str()).unwrap_or(DEFAULT_SORT);
    let limit = source
        .config
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    let min_score = source.config.get("min_score").and_then(|v| v.as_i64()).unwrap_or(0);

    let listing = fetch_listing(ctx, auth, api_base_url, subreddit, sort, limit).await?;

    let section_id = presettable_section(ctx, source).await;
    let mut inserted = 0usize;

    for child in listing.data.children {
        let post = child.data;

        if post.stickied || post.score <= min_score {
            continue;
        }

        let (content, url) = if post.is_self {
            (Some(post.selftext.clone()), format!("https://reddit.com{}", post.permalink))
        } else {
            (extract_content(ctx, &post.url).await, post.url.clone())
        };

        let canonical_url = canonicalize_url(&url);
        let url_hash = hash_url(&url);

        if !ctx.dedup.is_new(&url).await? {
            continue;
        }

        let published_at = chrono::DateTime::from_timestamp(post.created_utc as i64, 0)
            .map(|dt| dt.with_timezone(&chrono::Utc));

        let metadata = json!({
            "source_name": source.name,
            "source_ref": source.id,
            "canonical_url": canonical_url,
            "url_hash": url_hash,
            "forum_score": post.score,
            "comment_count": post.num_comments,
            "subreddit": post.subreddit,
            "post_id": post.id,
            "is_self": post.is_self,
            "permalink": post.permalink,
        });

        let filter = ArticleFilter {
            source_type: SourceType::SocialForum,
            source_id: &post.id,
            section_id,
            url: &url,
            title: &post.title,
            content: content.as_deref(),
            author: Some(&post.author),
            published_at,
            metadata,
        };

        if insert_and_publish(ctx, filter).await?.is_some() {
            inserted += 1;
        }
    }

    Ok(inserted)
}

async fn fetch_listing(
    ctx: &WorkerContext,
    auth: &ForumAuth,
    api_base_url: &str,
    subreddit: &str,
    sort: &str,
    limit: u32,
) -> Result<Listing, IngestError> {
    let url = format!("{api_base_url}/r/{subreddit}/{sort}.json?limit={limit}");
    let token = auth.token().await?;

    let response = ctx.transport.get_with_bearer(&url, &token).await?;
    if response.status().as_u16() == 401 {
        let fresh_token = auth.invalidate_and_refresh().await?;
        let retried = ctx.transport.get_with_bearer(&url, &fresh_token).await?;
        return parse_listing(retried).await;
    }
    parse_listing(response).await
}

async fn parse_listing(response: reqwest::Response) -> Result<Listing, IngestError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IngestError::Upstream { status: status.as_u16(), body });
    }
    Ok(response.json().await?)
}

async fn extract_content(ctx: &WorkerContext, url: &str) -> Option<String> {
    let response = ctx.transport.get_content(url).await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;
    extract_readable_text(&body)
}
