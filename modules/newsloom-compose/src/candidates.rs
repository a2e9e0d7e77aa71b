//! Candidate gathering and cluster collapse.

use std::collections::HashMap;

use newsloom_common::{Article, Section};
use newsloom_store::Store;
use uuid::Uuid;

use crate::error::ComposeError;

/// Minimum candidate pool size regardless of a section's cap, so small
/// sections still get a meaningful pool to classify from.
const MIN_FETCH_LIMIT: i64 = 20;
const FETCH_MULTIPLIER: i64 = 6;

/// One cluster collapsed to its primary, ready for ranking.
pub struct Candidate {
    pub primary: Article,
    /// Non-primary members of the same cluster; these are never submitted
    /// to the LLM but follow the primary's fate (filtered or briefed).
    pub suppressed: Vec<Uuid>,
    pub source_count: usize,
    pub rank_score: f64,
}

/// Pull the pending pool for `section` and collapse it into ranked,
/// deduplicated candidates, capped at `section.max_briefing_articles`
///.
pub async fn gather(
    store: &Store,
    section: &Section,
    threshold_default: f64,
    threshold_min: f64,
    threshold_max: f64,
) -> Result<Vec<Candidate>, ComposeError> {
    let threshold = section.threshold(threshold_default, threshold_min, threshold_max);
    let fetch_limit = (section.max_briefing_articles as i64 * FETCH_MULTIPLIER).max(MIN_FETCH_LIMIT);

    let page = store
        .list_pending_articles_for_section(section.id, threshold, fetch_limit)
        .await?;

    let mut candidates = collapse_and_rank(page.articles);
    candidates.truncate(section.max_briefing_articles as usize);
    Ok(candidates)
}

/// Group by `cluster_id` (falling back to the article's own id when absent
/// so singletons form their own one-member group), pick each group's
/// primary, and rank groups by `relevance_score(primary) + bonus` desc,
/// ties broken by base score desc, ingestion desc, id asc.
fn collapse_and_rank(articles: Vec<Article>) -> Vec<Candidate> {
    let mut groups: HashMap<String, Vec<Article>> = HashMap::new();
    for article in articles {
        let key = article.cluster_id().unwrap_or_else(|| article.id.to_string());
        groups.entry(key).or_default().push(article);
    }

    let mut candidates: Vec<Candidate> = groups
        .into_values()
        .map(|members| {
            let primary_id = pick_primary(&members);
            let mut source_names = std::collections::HashSet::new();
            let mut suppressed = Vec::new();
            let mut primary = None;
            for member in members {
                source_names.insert(member.source_name().to_string());
                if member.id == primary_id {
                    primary = Some(member);
                } else {
                    suppressed.push(member.id);
                }
            }
            let primary = primary.expect("primary id is always chosen from the group's own members");
            let source_count = source_names.len();
            let bonus = if source_count > 1 { (source_count - 1) as f64 * 0.1 } else { 0.0 };
            let rank_score = primary.relevance_score.unwrap_or(0.0) + bonus;
            Candidate { primary, suppressed, source_count, rank_score }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.rank_score
            .total_cmp(&a.rank_score)
            .then_with(|| {
                b.primary
                    .relevance_score
                    .unwrap_or(0.0)
                    .total_cmp(&a.primary.relevance_score.unwrap_or(0.0))
            })
            .then_with(|| b.primary.ingested_at.cmp(&a.primary.ingested_at))
            .then_with(|| a.primary.id.cmp(&b.primary.id))
    });

    candidates
}

/// `metadata.cluster_primary_id` if it names a member of this exact group,
/// else highest signal score, else earliest `ingested_at`, else smallest id
///.
fn pick_primary(members: &[Article]) -> Uuid {
    if let Some(claimed) = members.first().and_then(|a| a.cluster_primary_id()) {
        if members.iter().any(|m| m.id == claimed) {
            return claimed;
        }
    }

    members
        .iter()
        .min_by(|a, b| {
            b.signal_score()
                .total_cmp(&a.signal_score())
                .then_with(|| a.ingested_at.cmp(&b.ingested_at))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|a| a.id)
        .expect("a cluster group is never empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newsloom_common::SourceType;

    fn article(id: Uuid, score: f64, metadata: serde_json::Value, ingested_at: chrono::DateTime<Utc>) -> Article {
        Article {
            id,
            source_type: SourceType::Syndication,
            source_id: "src".to_string(),
            section_id: None,
            url: format!("https://example.com/{id}"),
            title: "title".to_string(),
            content: None,
            summary: None,
            author: None,
            published_at: None,
            ingested_at,
            processed_at: None,
            embedding: None,
            relevance_score: Some(score),
            status: newsloom_common::ArticleStatus::Pending,
            metadata,
        }
    }

    #[test]
    fn singleton_articles_rank_by_relevance_score() {
        let now = Utc::now();
        let a = article(Uuid::new_v4(), 0.9, serde_json::json!({}), now);
        let b = article(Uuid::new_v4(), 0.3, serde_json::json!({}), now);
        let candidates = collapse_and_rank(vec![b.clone(), a.clone()]);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].primary.id, a.id);
        assert_eq!(candidates[1].primary.id, b.id);
    }

    #[test]
    fn cluster_collapses_to_primary_with_multi_source_bonus() {
        let now = Utc::now();
        let cluster_id = "11111111-2222-4333-8444-555555555555";
        let primary = article(
            Uuid::new_v4(),
            0.5,
            serde_json::json!({"cluster_id": cluster_id, "source_name": "hn", "aggregator_score": 100}),
            now,
        );
        let member = article(
            Uuid::new_v4(),
            0.4,
            serde_json::json!({"cluster_id": cluster_id, "source_name": "reddit"}),
            now,
        );

        let candidates = collapse_and_rank(vec![primary.clone(), member.clone()]);
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.primary.id, primary.id);
        assert_eq!(candidate.suppressed, vec![member.id]);
        assert_eq!(candidate.source_count, 2);
        assert!((candidate.rank_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn primary_without_signal_score_falls_back_to_earliest_ingestion() {
        let earlier = Utc::now() - chrono::Duration::hours(1);
        let later = Utc::now();
        let cluster_id = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";
        let a = article(Uuid::new_v4(), 0.5, serde_json::json!({"cluster_id": cluster_id}), earlier);
        let b = article(Uuid::new_v4(), 0.5, serde_json::json!({"cluster_id": cluster_id}), later);

        let candidates = collapse_and_rank(vec![b.clone(), a.clone()]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].primary.id, a.id);
    }
}
