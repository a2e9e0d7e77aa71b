//! The processor: pulls `articles.new` events
//! from the durable bus, embeds each article, scores and assigns it via the
//! relevance engine, and runs the semantic clusterer over pending articles.
//!
//! Per-message errors are local: a handler failure nacks the event for
//! immediate redelivery rather than aborting the consumer loop.

pub mod config;
pub mod error;

use newsloom_cluster::Neighbor;
use newsloom_common::{Article, ArticleStatus};
use newsloom_eventbus::{Consumer, EventBus, StoredEvent};
use newsloom_relevance::RelevanceEngine;
use newsloom_store::Store;
use uuid::Uuid;

pub use error::ProcessorError;

/// Pull batch size per cycle.
pub const PULL_BATCH_SIZE: i64 = 25;

pub struct Processor {
    store: Store,
    bus: EventBus,
    relevance: RelevanceEngine,
}

impl Processor {
    pub fn new(store: Store, bus: EventBus, relevance: RelevanceEngine) -> Self {
        Self { store, bus, relevance }
    }

    pub fn consumer(&self) -> Consumer {
        self.bus.consumer("processor", "articles.")
    }

    /// Delete acked/aged-out bus events. Call periodically,
    /// not every cycle.
    pub async fn prune_expired_events(&self) -> Result<u64, ProcessorError> {
        Ok(self.bus.prune_expired().await?)
    }

    /// Pull up to `PULL_BATCH_SIZE` events and handle each; returns the
    /// number handled (acked or terminally nacked, not counting empty
    /// pulls). A handler error is logged, the event is nacked, and the loop
    /// continues — one bad article never blocks the rest of the batch.
    pub async fn run_cycle(&self, consumer: &Consumer) -> Result<usize, ProcessorError> {
        let events = consumer.pull(PULL_BATCH_SIZE).await?;
        let mut handled = 0usize;

        for event in &events {
            match self.handle_event(event).await {
                Ok(()) => {
                    consumer.ack(event.seq).await?;
                    handled += 1;
                }
                Err(e) => {
                    tracing::warn!(seq = event.seq, error = %e, "processor: event handling failed, nacking");
                    consumer.nack(event.seq).await?;
                }
            }
        }

        Ok(handled)
    }

    async fn handle_event(&self, event: &StoredEvent) -> Result<(), ProcessorError> {
        let article_id = event
            .payload
            .get("article_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| ProcessorError::BadPayload(event.payload.to_string()))?;

        let mut article = self.store.get_article(article_id).await?;
        self.embed_article(&mut article).await?;

        let result = self.relevance.evaluate_article(&article).await?;
        self.store
            .update_article_section_and_status(article.id, Some(result.section_id), result.score, result.status)
            .await?;
        article.section_id = Some(result.section_id);
        article.relevance_score = Some(result.score);
        article.status = result.status;

        if matches!(result.status, ArticleStatus::Pending) {
            self.cluster_article(&article).await?;
            self.relevance.adjust_threshold(result.section_id).await?;
        }

        Ok(())
    }

    async fn embed_article(&self, article: &mut Article) -> Result<(), ProcessorError> {
        let text = embeddable_text(article);
        let mut vectors = self.relevance.embed_client().embed(&[text]).await?;
        let embedding = vectors.pop().unwrap_or_default();
        self.store.update_article_embedding(article.id, &embedding).await?;
        article.embedding = Some(embedding);
        Ok(())
    }

    /// Look up the top-k nearest neighbors within 48h, apply the
    /// clusterer's pure decision, and persist the resulting metadata patch
    /// onto every member.
    async fn cluster_article(&self, article: &Article) -> Result<(), ProcessorError> {
        let Some(embedding) = article.embedding.as_ref() else { return Ok(()) };
        if embedding.is_empty() {
            return Ok(());
        }

        let neighbors = self
            .store
            .find_similar_last_48h(embedding, article.id, newsloom_cluster::DEFAULT_TOP_K)
            .await?
            .into_iter()
            .map(|(article, similarity)| Neighbor { article, similarity })
            .collect::<Vec<_>>();

        let Some(assignment) = newsloom_cluster::compute_cluster(article, &neighbors) else {
            return Ok(());
        };

        for member_id in &assignment.member_ids {
            let patch = serde_json::json!({
                "cluster_id": assignment.cluster_id,
                "cluster_primary_id": assignment.primary_id,
                "is_duplicate": assignment.is_duplicate(*member_id),
            });
            self.store.merge_article_metadata(*member_id, patch).await?;
        }

        Ok(())
    }
}

/// Build the text embedded for an article: title plus a content excerpt,
/// so the embedding reflects both the headline and the body.
fn embeddable_text(article: &Article) -> String {
    match &article.content {
        Some(content) if !content.is_empty() => format!("{}\n\n{}", article.title, content),
        _ => article.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newsloom_common::SourceType;

    fn sample_article(title: &str, content: Option<&str>) -> Article {
        Article {
            id: Uuid::new_v4(),
            source_type: SourceType::Syndication,
            source_id: "source-1".to_string(),
            section_id: None,
            url: "https://example.com/a".to_string(),
            title: title.to_string(),
            content: content.map(|s| s.to_string()),
            summary: None,
            author: None,
            published_at: None,
            ingested_at: Utc::now(),
            processed_at: None,
            embedding: None,
            relevance_score: None,
            status: ArticleStatus::Pending,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn embeddable_text_uses_title_only_when_content_absent() {
        let article = sample_article("Title Only", None);
        assert_eq!(embeddable_text(&article), "Title Only");
    }

    #[test]
    fn embeddable_text_uses_title_only_when_content_empty() {
        let article = sample_article("Title Only", Some(""));
        assert_eq!(embeddable_text(&article), "Title Only");
    }

    #[test]
    fn embeddable_text_concatenates_title_and_content() {
        let article = sample_article("Headline", Some("Body text here."));
        assert_eq!(embeddable_text(&article), "Headline\n\nBody text here.");
    }

    #[test]
    fn bad_payload_error_display_includes_raw_payload() {
        let err = ProcessorError::BadPayload(r#"{"foo":"bar"}"#.to_string());
        assert!(err.to_string().contains("foo"));
    }
}
