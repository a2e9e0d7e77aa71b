//! The relevance engine proper: section
//! assignment plus `score = pos_sim - 0.5*neg_sim + boost`, with the
//! startup caches (sections, seed centroids, thresholds, source indices)
//! guarded by a single reader-writer lock per spec.md §5 ("no in-process
//! shared mutable state except the relevance engine's caches").

use std::collections::HashMap;

use newsloom_common::{mean_vector, Article, ArticleStatus, Section, SourceType};
use newsloom_embed::EmbeddingClient;
use newsloom_store::Store;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::boost::SourceBoostMap;
use crate::error::RelevanceError;
use crate::scoring::{score, status_for};
use crate::threshold::{self, ThresholdConfig};

pub struct EvaluationResult {
    pub section_id: Uuid,
    pub score: f64,
    pub status: ArticleStatus,
}

struct SourceIndex {
    /// source_id -> linked section ids.
    section_links: HashMap<Uuid, Vec<Uuid>>,
    by_type: HashMap<SourceType, Vec<Uuid>>,
    names: HashMap<Uuid, String>,
    types: HashMap<Uuid, SourceType>,
}

struct Cache {
    sections: Vec<Section>,
    seed_centroids: HashMap<Uuid, Vec<f32>>,
    thresholds: HashMap<Uuid, f64>,
    sources: SourceIndex,
}

pub struct RelevanceEngine {
    store: Store,
    embed: EmbeddingClient,
    threshold_config: ThresholdConfig,
    boosts: SourceBoostMap,
    cache: RwLock<Cache>,
}

impl RelevanceEngine {
    /// Load enabled sections (sort_order asc), embed each section's seed
    /// keywords in one batched call, compute per-section centroids, and
    /// build the source reverse indices.
    pub async fn init(
        store: Store,
        embed: EmbeddingClient,
        threshold_config: ThresholdConfig,
        boosts: SourceBoostMap,
    ) -> Result<Self, RelevanceError> {
        let sections = store.list_enabled_sections().await?;

        let mut all_keywords = Vec::new();
        let mut spans: Vec<(Uuid, usize, usize)> = Vec::new();
        for section in &sections {
            let start = all_keywords.len();
            all_keywords.extend(section.seed_keywords.iter().cloned());
            spans.push((section.id, start, all_keywords.len()));
        }

        let embedded = if all_keywords.is_empty() {
            Vec::new()
        } else {
            embed.embed(&all_keywords).await?
        };

        let mut seed_centroids = HashMap::new();
        for (section_id, start, end) in spans {
            let slice: Vec<&[f32]> = embedded[start..end].iter().map(|v| v.as_slice()).collect();
            let centroid = mean_vector(slice);
            if !centroid.is_empty() {
                seed_centroids.insert(section_id, centroid);
            }
        }

        let mut thresholds = HashMap::new();
        for section in &sections {
            let t = section.threshold(threshold_config.default, threshold_config.min, threshold_config.max);
            thresholds.insert(section.id, t);
        }

        let sources = store.list_all_sources().await?;
        let section_links = store.all_source_section_links().await?;
        let mut by_type: HashMap<SourceType, Vec<Uuid>> = HashMap::new();
        let mut names = HashMap::new();
        let mut types = HashMap::new();
        for s in &sources {
            by_type.entry(s.source_type).or_default().push(s.id);
            names.insert(s.id, s.name.clone());
            types.insert(s.id, s.source_type);
        }

        Ok(Self {
            store,
            embed,
            threshold_config,
            boosts,
            cache: RwLock::new(Cache {
                sections,
                seed_centroids,
                thresholds,
                sources: SourceIndex { section_links, by_type, names, types },
            }),
        })
    }

    pub async fn current_threshold(&self, section_id: Uuid) -> f64 {
        self.cache
            .read()
            .await
            .thresholds
            .get(&section_id)
            .copied()
            .unwrap_or(self.threshold_config.default)
    }

    /// Resolve the embedding service's unreachable-at-startup case aside,
    /// nothing here touches I/O beyond the one-time `init` load and the
    /// periodic profile lookups inside `evaluate_article`.
    pub fn embed_client(&self) -> &EmbeddingClient {
        &self.embed
    }

    /// spec.md §4.7 `evaluate_article`: resolves the source, determines
    /// candidate sections, scores against each candidate's positive
    /// profile (or seed centroid), and assigns pending/archived.
    pub async fn evaluate_article(&self, article: &Article) -> Result<EvaluationResult, RelevanceError> {
        let embedding = article.embedding.clone().unwrap_or_default();
        let cache = self.cache.read().await;

        if cache.sections.is_empty() {
            return Err(RelevanceError::NoSections);
        }

        let source_id = self.resolve_source_id(article, &cache);

        let candidate_sections: Vec<Section> = match source_id.and_then(|id| cache.sources.section_links.get(&id)) {
            Some(links) if links.len() == 1 => cache
                .sections
                .iter()
                .filter(|s| s.id == links[0])
                .cloned()
                .collect(),
            _ => cache.sections.clone(),
        };

        let candidate_sections = if candidate_sections.is_empty() {
            cache.sections.clone()
        } else {
            candidate_sections
        };

        drop(cache);

        // Step 3: pick the best-matching candidate by cosine similarity to
        // each candidate's positive embedding (profile if present, else
        // seed centroid).
        let mut best: Option<(Uuid, f64)> = None;
        let mut positives: HashMap<Uuid, Vec<f32>> = HashMap::new();
        for section in &candidate_sections {
            let positive = self.positive_embedding(section.id).await?;
            let sim = newsloom_common::cosine_similarity(&embedding, &positive);
            if best.as_ref().map(|(_, best_sim)| sim > *best_sim).unwrap_or(true) {
                best = Some((section.id, sim));
            }
            positives.insert(section.id, positive);
        }

        let (section_id_chosen, _) = best.ok_or(RelevanceError::NoSections)?;

        let profile = self.store.get_section_profile(section_id_chosen).await?;
        let positive = positives
            .remove(&section_id_chosen)
            .unwrap_or_default();
        let negative = profile.and_then(|p| p.negative_embedding).unwrap_or_default();

        let pos_sim = newsloom_common::cosine_similarity(&embedding, &positive);
        let neg_sim = if negative.is_empty() {
            0.0
        } else {
            newsloom_common::cosine_similarity(&embedding, &negative)
        };

        let cache = self.cache.read().await;
        let boost = match source_id {
            Some(id) => {
                let name = cache.sources.names.get(&id).cloned().unwrap_or_default();
                let source_type = cache.sources.types.get(&id).copied().unwrap_or(article.source_type);
                self.boosts.resolve(id, &name, source_type)
            }
            None => self.boosts.resolve(Uuid::nil(), "", article.source_type),
        };
        let threshold = cache
            .thresholds
            .get(&section_id_chosen)
            .copied()
            .unwrap_or(self.threshold_config.default);
        drop(cache);

        let final_score = score(pos_sim, neg_sim, boost);
        let status = status_for(final_score, threshold);

        Ok(EvaluationResult { section_id: section_id_chosen, score: final_score, status })
    }

    /// The positive embedding for a section: its profile's vector if
    /// present and non-empty, else the seed-keyword centroid.
    async fn positive_embedding(&self, section_id: Uuid) -> Result<Vec<f32>, RelevanceError> {
        if let Some(profile) = self.store.get_section_profile(section_id).await? {
            if let Some(v) = profile.positive_embedding {
                if !v.is_empty() {
                    return Ok(v);
                }
            }
        }
        Ok(self
            .cache
            .read()
            .await
            .seed_centroids
            .get(&section_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Resolve the source via `metadata.source_ref`; if absent and
    /// exactly one source exists for the article's type, fall back to
    /// that one.
    fn resolve_source_id(&self, article: &Article, cache: &Cache) -> Option<Uuid> {
        if let Some(raw) = article.metadata_str("source_ref") {
            if let Ok(id) = Uuid::parse_str(raw) {
                return Some(id);
            }
        }
        let ids = cache.sources.by_type.get(&article.source_type)?;
        if ids.len() == 1 {
            return Some(ids[0]);
        }
        None
    }

    /// spec.md §4.7 `adjust_threshold`: count pending articles at/above
    /// the current threshold, nudge by `step` if outside `[5, 50]`, clamp,
    /// persist, and refresh the in-memory cache only if it actually
    /// changed.
    pub async fn adjust_threshold(&self, section_id: Uuid) -> Result<f64, RelevanceError> {
        let current = self.current_threshold(section_id).await;
        let count = self.store.count_pending_above_threshold(section_id, current).await?;
        let next = threshold::adjust(current, count, &self.threshold_config);

        if (next - current).abs() > f64::EPSILON {
            self.store.update_section_threshold(section_id, next).await?;
            self.cache.write().await.thresholds.insert(section_id, next);
        }
        Ok(next)
    }
}
