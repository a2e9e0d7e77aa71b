//! Provider-agnostic LLM orchestration.
//!
//! Exposes a small capability set — classify / summarize / generate_briefing
//! — behind one [`LlmProvider`] trait, with two wire-format adapters: an
//! OpenAI-compatible chat-completions client and an Anthropic-style
//! messages client (distinct system/messages split and auth header). Which
//! adapter backs a given `Arc<dyn LlmProvider>` is decided once, at
//! construction, from a plain string identifier — callers above this crate
//! never match on provider again.

pub mod anthropic;
pub mod error;
pub mod openai;
pub mod prompts;
pub mod util;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::LlmError;

/// Every outbound call (classify, summarize, briefing) is bounded by this
/// hard timeout regardless of provider.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One article handed to the classifier: just enough for the model to
/// judge relevance/section/clickbait-ness without re-sending the full body.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyInput {
    pub article_id: String,
    pub title: String,
    pub excerpt: String,
    pub current_section: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClassifyResult {
    pub article_id: String,
    pub relevant: bool,
    /// Section name the classifier believes this article belongs in;
    /// may differ from the section it was submitted under.
    pub section: String,
    pub clickbait: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeInput {
    pub title: String,
    pub content: String,
    pub section: String,
}

/// One section's worth of summarized articles, ready for the final
/// briefing-composition call.
#[derive(Debug, Clone, Serialize)]
pub struct BriefingSectionInput {
    pub section_display_name: String,
    pub summaries: Vec<ArticleSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub source_name: String,
}

/// Estimate token count for bookkeeping: `ceil(len(prompt) / 4)`. Not a tokenizer — a cheap heuristic used only for the
/// briefing's `tokens_estimated` / `token_breakdown` metadata.
pub fn estimate_tokens(prompt: &str) -> u64 {
    ((prompt.len() as u64) + 3) / 4
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Batched relevance/clickbait/section classification.
    async fn classify(&self, articles: &[ClassifyInput]) -> Result<Vec<ClassifyResult>, LlmError>;

    /// A 2-3 sentence summary of one article.
    async fn summarize(&self, input: &SummarizeInput) -> Result<String, LlmError>;

    /// Synthesize the final markdown briefing from per-section summaries.
    async fn generate_briefing(&self, sections: &[BriefingSectionInput]) -> Result<String, LlmError>;
}

/// Construct a provider from a string identifier plus the env vars it
/// needs.
/// `"openai"` (or any OpenAI-compatible endpoint, including OpenRouter via
/// a custom `endpoint`) selects [`openai::OpenAiProvider`]; `"anthropic"`
/// selects [`anthropic::AnthropicProvider`].
pub fn provider_from_parts(
    kind: &str,
    api_key: String,
    model: String,
    endpoint: Option<String>,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match kind {
        "openai" | "openai-compatible" | "openrouter" => {
            Ok(Arc::new(openai::OpenAiProvider::new(api_key, model, endpoint)))
        }
        "anthropic" | "claude" => Ok(Arc::new(anthropic::AnthropicProvider::new(api_key, model, endpoint))),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_ceils_len_over_4() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(400)), 100);
    }

    #[test]
    fn unknown_provider_identifier_errors() {
        let err = provider_from_parts("cohere", "key".into(), "model".into(), None);
        assert!(matches!(err, Err(LlmError::UnknownProvider(_))));
    }

    #[test]
    fn openrouter_dispatches_to_openai_adapter() {
        let provider = provider_from_parts(
            "openrouter",
            "key".into(),
            "model".into(),
            Some("https://openrouter.ai/api/v1".into()),
        );
        assert!(provider.is_ok());
    }
}
