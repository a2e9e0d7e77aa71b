//! Briefing composer: gathers scored,
//! cluster-collapsed candidates per section, runs them through the LLM
//! pipeline (classify, summarize, compose), and persists the result.
//!
//! Every LLM sub-call degrades gracefully rather than aborting the run:
//! a failed `classify` leaves its section's candidates pending and flags
//! the briefing `partial`; a failed `summarize` leaves that one article
//! pending; a failed `generate_briefing` falls back to a deterministic
//! local markdown. A briefing record is always produced.

pub mod candidates;
pub mod config;
pub mod error;
mod fallback;

use std::collections::HashMap;
use std::sync::Arc;

use newsloom_common::{Article, ArticleStatus, Section};
use newsloom_llm::{
    ArticleSummary, BriefingSectionInput, ClassifyInput, LlmProvider, SummarizeInput,
};
use newsloom_store::{NewBriefing, Store};
use uuid::Uuid;

pub use error::ComposeError;

const MULTI_SOURCE_SECTION_TITLE: &str = "Multi-Source Coverage";
/// Excerpt length handed to the classifier, in bytes (keeps the batched
/// classify prompt small regardless of article body size).
const EXCERPT_BYTES: usize = 500;

pub struct BriefingComposer {
    store: Store,
    llm: Arc<dyn LlmProvider>,
    threshold_default: f64,
    threshold_min: f64,
    threshold_max: f64,
}

struct KeptArticle {
    primary_id: Uuid,
    suppressed: Vec<Uuid>,
    title: String,
    url: String,
    source_name: String,
    summary: String,
    source_count: usize,
}

impl BriefingComposer {
    pub fn new(
        store: Store,
        llm: Arc<dyn LlmProvider>,
        threshold_default: f64,
        threshold_min: f64,
        threshold_max: f64,
    ) -> Self {
        Self { store, llm, threshold_default, threshold_min, threshold_max }
    }

    /// Run one full composition cycle and persist the resulting briefing
    ///.
    pub async fn run_once(&self) -> Result<newsloom_common::Briefing, ComposeError> {
        let sections = self.store.list_enabled_sections().await?;
        let section_by_name: HashMap<String, Section> =
            sections.iter().map(|s| (s.name.to_lowercase(), s.clone())).collect();

        let mut kept_by_section: HashMap<Uuid, Vec<KeptArticle>> = HashMap::new();
        let mut kept_counts: HashMap<Uuid, usize> = HashMap::new();
        let mut section_totals: HashMap<String, newsloom_common::SectionTotals> = HashMap::new();
        let mut tokens_classify = 0u64;
        let mut tokens_summarize = 0u64;
        let mut any_partial = false;
        let mut pending_count = 0u64;

        for section in &sections {
            let outcome = self
                .process_section(
                    section,
                    &section_by_name,
                    &mut kept_by_section,
                    &mut kept_counts,
                )
                .await?;

            tokens_classify += outcome.tokens_classify;
            tokens_summarize += outcome.tokens_summarize;
            any_partial |= outcome.partial;
            pending_count += outcome.pending;
            section_totals.insert(
                section.name.clone(),
                newsloom_common::SectionTotals { total: outcome.total, filtered: outcome.filtered },
            );
        }

        let (briefing_sections, all_kept) = assemble_sections(&sections, kept_by_section);

        let tokens_briefing = newsloom_llm::estimate_tokens(&format!(
            "{}{}",
            newsloom_llm::prompts::briefing_system_prompt(),
            newsloom_llm::prompts::briefing_user_prompt(&briefing_sections)
        ));

        let (content, briefing_partial) = match self.llm.generate_briefing(&briefing_sections).await {
            Ok(markdown) => (markdown, false),
            Err(e) => {
                tracing::warn!(error = %e, "generate_briefing failed, using local fallback");
                (fallback::build_markdown(&briefing_sections), true)
            }
        };
        any_partial |= briefing_partial;

        let primary_ids: Vec<Uuid> = all_kept.iter().map(|k| k.primary_id).collect();
        let suppressed_ids: Vec<Uuid> =
            all_kept.iter().flat_map(|k| k.suppressed.iter().copied()).collect();

        self.store.update_article_statuses(&primary_ids, ArticleStatus::Briefed).await?;
        self.store.update_article_statuses(&suppressed_ids, ArticleStatus::Processed).await?;

        let metadata = newsloom_common::BriefingMetadata {
            sections: section_totals,
            tokens_estimated: tokens_classify + tokens_summarize + tokens_briefing,
            token_breakdown: newsloom_common::TokenBreakdown {
                classify: tokens_classify,
                summarize: tokens_summarize,
                briefing: tokens_briefing,
            },
            partial: any_partial,
            pending_count: if any_partial { Some(pending_count) } else { None },
        };

        let briefing = self
            .store
            .create_briefing(NewBriefing { content, article_ids: primary_ids, metadata })
            .await?;
        Ok(briefing)
    }

    async fn process_section(
        &self,
        section: &Section,
        section_by_name: &HashMap<String, Section>,
        kept_by_section: &mut HashMap<Uuid, Vec<KeptArticle>>,
        kept_counts: &mut HashMap<Uuid, usize>,
    ) -> Result<SectionOutcome, ComposeError> {
        let candidates = candidates::gather(
            &self.store,
            section,
            self.threshold_default,
            self.threshold_min,
            self.threshold_max,
        )
        .await?;
        let total = candidates.len() as u64;
        if candidates.is_empty() {
            return Ok(SectionOutcome::default_for(total));
        }

        let classify_inputs: Vec<ClassifyInput> = candidates
            .iter()
            .map(|c| ClassifyInput {
                article_id: c.primary.id.to_string(),
                title: c.primary.title.clone(),
                excerpt: excerpt_of(&c.primary),
                current_section: section.name.clone(),
            })
            .collect();

        let tokens_classify = newsloom_llm::estimate_tokens(&format!(
            "{}{}",
            newsloom_llm::prompts::classify_system_prompt(),
            newsloom_llm::prompts::classify_user_prompt(&classify_inputs)
        ));

        let results = match self.llm.classify(&classify_inputs).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(section = %section.name, error = %e, "classify failed, section left pending");
                return Ok(SectionOutcome {
                    total,
                    filtered: 0,
                    partial: true,
                    pending: total,
                    tokens_classify,
                    tokens_summarize: 0,
                });
            }
        };
        let by_id: HashMap<String, newsloom_llm::ClassifyResult> =
            results.into_iter().map(|r| (r.article_id.clone(), r)).collect();

        let mut filtered = 0u64;
        let mut partial = false;
        let mut pending = 0u64;
        let mut tokens_summarize = 0u64;

        for candidate in candidates {
            let Some(result) = by_id.get(&candidate.primary.id.to_string()) else {
                tracing::warn!(article_id = %candidate.primary.id, "classifier omitted article, left pending");
                pending += 1;
                continue;
            };

            if !result.relevant || result.clickbait {
                filtered += 1;
                self.mark_filtered(&candidate.primary.id, &candidate.suppressed).await?;
                continue;
            }

            let target = resolve_target_section(section, &result.section, section_by_name);
            let cap = target.max_briefing_articles.max(0) as usize;
            let current = *kept_counts.get(&target.id).unwrap_or(&0);
            if current >= cap {
                filtered += 1;
                self.mark_filtered(&candidate.primary.id, &candidate.suppressed).await?;
                continue;
            }

            let summarize_input = SummarizeInput {
                title: candidate.primary.title.clone(),
                content: candidate.primary.content.clone().unwrap_or_default(),
                section: target.display_name.clone(),
            };
            tokens_summarize += newsloom_llm::estimate_tokens(&format!(
                "{}{}",
                newsloom_llm::prompts::summarize_system_prompt(),
                newsloom_llm::prompts::summarize_user_prompt(&summarize_input)
            ));

            let summary = match self.llm.summarize(&summarize_input).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(article_id = %candidate.primary.id, error = %e, "summarize failed, left pending");
                    partial = true;
                    pending += 1;
                    continue;
                }
            };

            self.store.update_article_summary(candidate.primary.id, &summary).await?;
            if target.id != section.id {
                self.store
                    .update_article_section_and_status(
                        candidate.primary.id,
                        Some(target.id),
                        candidate.primary.relevance_score.unwrap_or(0.0),
                        ArticleStatus::Pending,
                    )
                    .await?;
            }

            *kept_counts.entry(target.id).or_insert(0) += 1;
            kept_by_section.entry(target.id).or_default().push(KeptArticle {
                primary_id: candidate.primary.id,
                suppressed: candidate.suppressed,
                title: candidate.primary.title.clone(),
                url: candidate.primary.url.clone(),
                source_name: candidate.primary.source_name().to_string(),
                summary,
                source_count: candidate.source_count,
            });
        }

        Ok(SectionOutcome { total, filtered, partial, pending, tokens_classify, tokens_summarize })
    }

    async fn mark_filtered(&self, primary_id: &Uuid, suppressed: &[Uuid]) -> Result<(), ComposeError> {
        let mut ids = suppressed.to_vec();
        ids.push(*primary_id);
        self.store.update_article_statuses(&ids, ArticleStatus::Processed).await?;
        Ok(())
    }
}

#[derive(Default)]
struct SectionOutcome {
    total: u64,
    filtered: u64,
    partial: bool,
    pending: u64,
    tokens_classify: u64,
    tokens_summarize: u64,
}

impl SectionOutcome {
    fn default_for(total: u64) -> Self {
        Self { total, ..Default::default() }
    }
}

/// Case-insensitive reassignment by name; an
/// unrecognized name leaves the article under its originating section.
fn resolve_target_section(
    origin: &Section,
    classifier_name: &str,
    section_by_name: &HashMap<String, Section>,
) -> Section {
    if classifier_name.eq_ignore_ascii_case(&origin.name) {
        return origin.clone();
    }
    section_by_name.get(&classifier_name.to_lowercase()).cloned().unwrap_or_else(|| origin.clone())
}

fn excerpt_of(article: &Article) -> String {
    let text = article.content.as_deref().or(article.summary.as_deref()).unwrap_or(&article.title);
    newsloom_llm::util::truncate_to_char_boundary(text, EXCERPT_BYTES).to_string()
}

/// Build the per-section `BriefingSectionInput` list (in section sort
/// order) plus a trailing multi-source-coverage section listing every kept
/// article whose cluster spans more than one source name, and the flat list of kept articles in the same order used for
/// `article_ids`.
fn assemble_sections(
    sections: &[Section],
    mut kept_by_section: HashMap<Uuid, Vec<KeptArticle>>,
) -> (Vec<BriefingSectionInput>, Vec<KeptArticle>) {
    let mut out = Vec::new();
    let mut all_kept = Vec::new();
    let mut multi_source_summaries = Vec::new();

    for section in sections {
        let Some(kept) = kept_by_section.remove(&section.id) else { continue };
        if kept.is_empty() {
            continue;
        }
        let summaries: Vec<ArticleSummary> = kept
            .iter()
            .map(|k| ArticleSummary {
                title: k.title.clone(),
                url: k.url.clone(),
                summary: k.summary.clone(),
                source_name: k.source_name.clone(),
            })
            .collect();
        for k in &kept {
            if k.source_count > 1 {
                multi_source_summaries.push(ArticleSummary {
                    title: k.title.clone(),
                    url: k.url.clone(),
                    summary: k.summary.clone(),
                    source_name: k.source_name.clone(),
                });
            }
        }
        out.push(BriefingSectionInput { section_display_name: section.display_name.clone(), summaries });
        all_kept.extend(kept);
    }

    if !multi_source_summaries.is_empty() {
        out.push(BriefingSectionInput {
            section_display_name: MULTI_SOURCE_SECTION_TITLE.to_string(),
            summaries: multi_source_summaries,
        });
    }

    (out, all_kept)
}
