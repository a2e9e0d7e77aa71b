//! Core domain types shared across every crate in the pipeline.
//!
//! These map directly onto the entities of the data model: sections, sources,
//! articles, section profiles, feedback and briefings. None of these types
//! own a database connection — persistence lives in `newsloom-store`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dimensionality of the embedding vector produced by the embedding service
/// and stored alongside every article.
pub const EMBEDDING_DIM: usize = 384;

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub id: Uuid,
    /// Unique slug, e.g. "cybersecurity".
    pub name: String,
    pub display_name: String,
    pub enabled: bool,
    pub sort_order: i32,
    pub max_briefing_articles: i32,
    pub seed_keywords: Vec<String>,
    /// Free-form config map. Recognized key: `relevance_threshold` (float).
    pub config: serde_json::Value,
}

impl Section {
    /// Threshold from `config.relevance_threshold`, falling back to
    /// `config.threshold`, clamped to `[min, max]`, or `default` if absent.
    pub fn threshold(&self, default: f64, min: f64, max: f64) -> f64 {
        let raw = self
            .config
            .get("relevance_threshold")
            .or_else(|| self.config.get("threshold"))
            .and_then(|v| v.as_f64())
            .unwrap_or(default);
        raw.clamp(min, max)
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Syndication,
    SocialAggregator,
    SocialForum,
    ForgeReleases,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceType::Syndication => "syndication",
            SourceType::SocialAggregator => "social-aggregator",
            SourceType::SocialForum => "social-forum",
            SourceType::ForgeReleases => "forge-releases",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "syndication" => Ok(Self::Syndication),
            "social-aggregator" => Ok(Self::SocialAggregator),
            "social-forum" => Ok(Self::SocialForum),
            "forge-releases" => Ok(Self::ForgeReleases),
            other => Err(format!("unknown source type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Source {
    pub id: Uuid,
    pub source_type: SourceType,
    pub name: String,
    /// Type-specific config: feed URL, subreddit+min_score+sort+limit, or
    /// owner/repo for forge releases.
    pub config: serde_json::Value,
    pub enabled: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub error_count: i32,
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Processed,
    Briefed,
    Archived,
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Processed => "processed",
            ArticleStatus::Briefed => "briefed",
            ArticleStatus::Archived => "archived",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processed" => Ok(Self::Processed),
            "briefed" => Ok(Self::Briefed),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown article status: {other}")),
        }
    }
}

impl ArticleStatus {
    /// Whether `self -> next` is a legal lifecycle transition.
    /// There is no transition defined *into* `Pending` — it's the creation
    /// state — so this only validates forward movement from an existing row.
    pub fn can_transition_to(self, next: ArticleStatus) -> bool {
        use ArticleStatus::*;
        matches!(
            (self, next),
            (Pending, Processed) | (Pending, Archived) | (Processed, Briefed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Article {
    pub id: Uuid,
    pub source_type: SourceType,
    pub source_id: String,
    pub section_id: Option<Uuid>,
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub ingested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub relevance_score: Option<f64>,
    pub status: ArticleStatus,
    pub metadata: serde_json::Value,
}

impl Article {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(|v| v.as_f64())
    }

    pub fn metadata_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(|v| v.as_bool())
    }

    /// The "signal score" used to pick cluster primaries: the max of
    /// `aggregator_score` and `forum_score` present in metadata.
    pub fn signal_score(&self) -> f64 {
        let agg = self.metadata_f64("aggregator_score").unwrap_or(0.0);
        let forum = self.metadata_f64("forum_score").unwrap_or(0.0);
        agg.max(forum)
    }

    pub fn cluster_id(&self) -> Option<String> {
        self.metadata_str("cluster_id").map(str::to_string)
    }

    pub fn cluster_primary_id(&self) -> Option<Uuid> {
        self.metadata_str("cluster_primary_id")
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn is_duplicate(&self) -> bool {
        self.metadata_bool("is_duplicate").unwrap_or(false)
    }

    /// Human-readable source name carried in metadata by the ingestion
    /// worker that produced this article (falls back to the raw source_id).
    pub fn source_name(&self) -> &str {
        self.metadata_str("source_name").unwrap_or(&self.source_id)
    }

    pub fn merge_metadata(&mut self, patch: serde_json::Value) {
        if let (serde_json::Value::Object(existing), serde_json::Value::Object(new)) =
            (&mut self.metadata, patch)
        {
            existing.extend(new);
        }
    }
}

// ---------------------------------------------------------------------------
// SectionProfile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionProfile {
    pub section_id: Uuid,
    pub positive_embedding: Option<Vec<f32>>,
    pub negative_embedding: Option<Vec<f32>>,
    pub like_count: i32,
    pub dislike_count: i32,
    pub updated_at: DateTime<Utc>,
}

impl SectionProfile {
    pub fn empty(section_id: Uuid) -> Self {
        Self {
            section_id,
            positive_embedding: None,
            negative_embedding: None,
            like_count: 0,
            dislike_count: 0,
            updated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Like,
    Dislike,
    Save,
}

impl std::fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FeedbackAction::Like => "like",
            FeedbackAction::Dislike => "dislike",
            FeedbackAction::Save => "save",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for FeedbackAction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            "save" => Ok(Self::Save),
            other => Err(format!("unknown feedback action: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Feedback {
    pub id: Uuid,
    pub article_id: Uuid,
    pub action: FeedbackAction,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Briefing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Briefing {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub content: String,
    pub article_ids: Vec<Uuid>,
    pub metadata: BriefingMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BriefingMetadata {
    pub sections: HashMap<String, SectionTotals>,
    pub tokens_estimated: u64,
    pub token_breakdown: TokenBreakdown,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SectionTotals {
    pub total: u64,
    pub filtered: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TokenBreakdown {
    pub classify: u64,
    pub summarize: u64,
    pub briefing: u64,
}
