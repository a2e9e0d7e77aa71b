//! Feedback profiler: recomputes a section's
//! positive/negative embeddings from its like/dislike history, either
//! immediately (on each feedback event) or periodically. `save` never
//! triggers recomputation — callers simply never call into this crate
//! for it.

mod blend;
pub mod config;
mod error;

use newsloom_common::{mean_vector, SectionProfile};
use newsloom_embed::EmbeddingClient;
use newsloom_store::Store;
use uuid::Uuid;

pub use blend::DEFAULT_RECENCY_WEIGHT;
pub use error::FeedbackError;

/// How profile recomputation is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Recompute just the affected section on each like/dislike
    /// creation or deletion.
    Immediate,
    /// Recompute all sections on a fixed interval, and once at startup.
    Periodic,
}

impl TriggerMode {
    pub fn parse(s: &str) -> Self {
        match s {
            "periodic" => TriggerMode::Periodic,
            _ => TriggerMode::Immediate,
        }
    }
}

pub struct FeedbackProfiler {
    store: Store,
    embed: EmbeddingClient,
    recency_weight: f32,
}

impl FeedbackProfiler {
    pub fn new(store: Store, embed: EmbeddingClient) -> Self {
        Self { store, embed, recency_weight: DEFAULT_RECENCY_WEIGHT }
    }

    pub fn with_recency_weight(mut self, w: f32) -> Self {
        self.recency_weight = w;
        self
    }

    /// Recompute one section's profile and persist it.
    pub async fn recompute_section(&self, section_id: Uuid) -> Result<SectionProfile, FeedbackError> {
        let section = self.store.get_section(section_id).await?;

        let recent_pos_vectors = self
            .store
            .list_section_embeddings_by_feedback_action(section_id, "like")
            .await?;
        let recent_neg_vectors = self
            .store
            .list_section_embeddings_by_feedback_action(section_id, "dislike")
            .await?;

        let like_count = recent_pos_vectors.len() as i32;
        let dislike_count = recent_neg_vectors.len() as i32;

        let recent_pos = mean_vector(recent_pos_vectors.iter().map(|v| v.as_slice()));
        let recent_neg = mean_vector(recent_neg_vectors.iter().map(|v| v.as_slice()));

        let existing = self.store.get_section_profile(section_id).await?;
        let historical_pos = existing.as_ref().and_then(|p| p.positive_embedding.as_deref());
        let historical_neg = existing.as_ref().and_then(|p| p.negative_embedding.as_deref());

        let positive = if recent_pos.is_empty() {
            self.seed_centroid(&section.seed_keywords).await?
        } else {
            blend::blend_positive(&recent_pos, historical_pos, &[], self.recency_weight)
        };

        let negative = blend::blend_negative(&recent_neg, historical_neg, self.recency_weight);

        let profile = SectionProfile {
            section_id,
            positive_embedding: if positive.is_empty() { None } else { Some(positive) },
            negative_embedding: negative,
            like_count,
            dislike_count,
            updated_at: chrono::Utc::now(),
        };

        self.store.upsert_section_profile(&profile).await?;
        Ok(profile)
    }

    /// Recompute every enabled section's profile.
    pub async fn recompute_all(&self) -> Result<Vec<SectionProfile>, FeedbackError> {
        let sections = self.store.list_enabled_sections().await?;
        let mut out = Vec::with_capacity(sections.len());
        for section in sections {
            match self.recompute_section(section.id).await {
                Ok(p) => out.push(p),
                Err(e) => tracing::warn!(section_id = %section.id, error = %e, "profile recomputation failed"),
            }
        }
        Ok(out)
    }

    /// Embed a section's seed keywords on demand and take their centroid
    ///.
    async fn seed_centroid(&self, seed_keywords: &[String]) -> Result<Vec<f32>, FeedbackError> {
        if seed_keywords.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.embed.embed(seed_keywords).await?;
        Ok(mean_vector(vectors.iter().map(|v| v.as_slice())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_mode_parses_periodic_and_defaults_to_immediate() {
        assert_eq!(TriggerMode::parse("periodic"), TriggerMode::Periodic);
        assert_eq!(TriggerMode::parse("immediate"), TriggerMode::Immediate);
        assert_eq!(TriggerMode::parse("garbage"), TriggerMode::Immediate);
    }
}
