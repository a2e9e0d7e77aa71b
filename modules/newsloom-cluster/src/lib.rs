//! Semantic near-duplicate clusterer.
//!
//! Pure decision logic lives here; the caller (the processor) is
//! responsible for fetching neighbors via `Store::find_similar_last_48h`
//! and persisting the resulting metadata patches.

use std::cmp::Ordering;

use newsloom_common::Article;
use uuid::Uuid;

/// Neighbors at or below this similarity are not considered duplicates
///.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Default top-k neighbors considered.
pub const DEFAULT_TOP_K: i64 = 5;

pub struct Neighbor {
    pub article: Article,
    pub similarity: f64,
}

/// Resulting cluster assignment: every member (current + matched
/// neighbors) gets `{cluster_id, cluster_primary_id, is_duplicate}`
/// merged into its metadata.
pub struct ClusterAssignment {
    pub cluster_id: String,
    pub primary_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

impl ClusterAssignment {
    pub fn is_duplicate(&self, member_id: Uuid) -> bool {
        member_id != self.primary_id
    }
}

/// Filter neighbors to similarity > 0.85; if none remain, no cluster
/// update. Otherwise reuse the oldest existing `cluster_id` among members,
/// or mint a fresh one; pick the primary by highest signal score, then
/// earliest ingestion, then smallest id.
pub fn compute_cluster(current: &Article, neighbors: &[Neighbor]) -> Option<ClusterAssignment> {
    let matched: Vec<&Article> = neighbors
        .iter()
        .filter(|n| n.similarity > SIMILARITY_THRESHOLD)
        .map(|n| &n.article)
        .collect();

    if matched.is_empty() {
        return None;
    }

    let members: Vec<&Article> = std::iter::once(current).chain(matched).collect();

    let cluster_id = members
        .iter()
        .filter_map(|a| a.cluster_id().map(|cid| (a.ingested_at, a.id, cid)))
        .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, _, cid)| cid)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let primary = members
        .iter()
        .min_by(|a, b| cmp_by_primary_priority(a, b))
        .expect("members is non-empty");

    Some(ClusterAssignment {
        cluster_id,
        primary_id: primary.id,
        member_ids: members.iter().map(|a| a.id).collect(),
    })
}

/// Ordering used to pick the primary: highest signal score first, ties by
/// earliest `ingested_at`, then smallest `id`.
fn cmp_by_primary_priority(a: &Article, b: &Article) -> Ordering {
    b.signal_score()
        .partial_cmp(&a.signal_score())
        .unwrap_or(Ordering::Equal)
        .then(a.ingested_at.cmp(&b.ingested_at))
        .then(a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use newsloom_common::{ArticleStatus, SourceType};
    use serde_json::json;

    fn article(id_byte: u8, metadata: serde_json::Value, ingested_offset_secs: i64) -> Article {
        Article {
            id: Uuid::from_bytes([id_byte; 16]),
            source_type: SourceType::SocialAggregator,
            source_id: format!("src-{id_byte}"),
            section_id: None,
            url: format!("https://example.com/{id_byte}"),
            title: "title".into(),
            content: None,
            summary: None,
            author: None,
            published_at: None,
            ingested_at: Utc::now() + Duration::seconds(ingested_offset_secs),
            processed_at: None,
            embedding: None,
            relevance_score: None,
            status: ArticleStatus::Pending,
            metadata,
        }
    }

    #[test]
    fn no_neighbors_above_threshold_yields_no_update() {
        let current = article(1, json!({}), 0);
        let neighbors = vec![Neighbor { article: article(2, json!({}), 0), similarity: 0.5 }];
        assert!(compute_cluster(&current, &neighbors).is_none());
    }

    #[test]
    fn s4_highest_signal_score_wins_primary() {
        let current = article(1, json!({"reddit_score": 40}), 0);
        let hn = article(2, json!({"aggregator_score": 142}), 1);
        let reddit = article(3, json!({"forum_score": 89}), 2);

        let neighbors = vec![
            Neighbor { article: hn.clone(), similarity: 0.96 },
            Neighbor { article: reddit.clone(), similarity: 0.91 },
        ];

        let result = compute_cluster(&current, &neighbors).unwrap();
        assert_eq!(result.primary_id, hn.id);
        assert_eq!(result.member_ids.len(), 3);
        assert!(!result.is_duplicate(hn.id));
        assert!(result.is_duplicate(reddit.id));
        assert!(result.is_duplicate(current.id));
    }

    #[test]
    fn s4_fresh_cluster_id_when_none_exists() {
        let current = article(1, json!({}), 0);
        let neighbor = article(2, json!({"aggregator_score": 100}), 1);
        let neighbors = vec![Neighbor { article: neighbor, similarity: 0.96 }];
        let result = compute_cluster(&current, &neighbors).unwrap();
        assert!(Uuid::parse_str(&result.cluster_id).is_ok());
    }

    #[test]
    fn s5_reuses_existing_cluster_id() {
        let existing_id = "11111111-2222-4333-8444-555555555555";
        let current = article(1, json!({}), 0);
        let neighbor = article(2, json!({"cluster_id": existing_id}), 1);
        let neighbors = vec![Neighbor { article: neighbor, similarity: 0.90 }];
        let result = compute_cluster(&current, &neighbors).unwrap();
        assert_eq!(result.cluster_id, existing_id);
    }

    #[test]
    fn ties_in_signal_score_broken_by_earliest_ingestion() {
        let current = article(1, json!({"aggregator_score": 50}), 10);
        let earlier = article(2, json!({"aggregator_score": 50}), 0);
        let neighbors = vec![Neighbor { article: earlier.clone(), similarity: 0.9 }];
        let result = compute_cluster(&current, &neighbors).unwrap();
        assert_eq!(result.primary_id, earlier.id);
    }

    #[test]
    fn boundary_similarity_of_exactly_threshold_is_excluded() {
        let current = article(1, json!({}), 0);
        let neighbor = article(2, json!({}), 0);
        let neighbors = vec![Neighbor { article: neighbor, similarity: SIMILARITY_THRESHOLD }];
        assert!(compute_cluster(&current, &neighbors).is_none());
    }
}
