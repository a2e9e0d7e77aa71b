//! OpenAI-compatible chat-completions adapter. Also serves OpenRouter and
//! any other vendor that speaks the same wire shape — they differ only in
//! `endpoint` and model name, both supplied at construction.

mod types;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::{util, BriefingSectionInput, ClassifyInput, ClassifyResult, LlmError, LlmProvider, SummarizeInput, REQUEST_TIMEOUT};

use types::{ChatRequest, ChatResponse, WireMessage};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, endpoint: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("building reqwest client with a fixed timeout cannot fail");
        Self {
            http,
            api_key,
            model,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .unwrap_or_else(|_| HeaderValue::from_static("")),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn chat(&self, system: String, user: String, temperature: f32, max_tokens: u32) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![WireMessage::system(system), WireMessage::user(user)],
            temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .headers(self.headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::Transport(e) })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider { provider: "openai", status: status.as_u16(), body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn classify(&self, articles: &[ClassifyInput]) -> Result<Vec<ClassifyResult>, LlmError> {
        let raw = self
            .chat(
                crate::prompts::classify_system_prompt(),
                crate::prompts::classify_user_prompt(articles),
                0.0,
                2048,
            )
            .await?;
        let stripped = util::strip_code_blocks(&raw);
        Ok(serde_json::from_str(stripped)?)
    }

    async fn summarize(&self, input: &SummarizeInput) -> Result<String, LlmError> {
        self.chat(
            crate::prompts::summarize_system_prompt(),
            crate::prompts::summarize_user_prompt(input),
            0.3,
            300,
        )
        .await
        .map(|s| s.trim().to_string())
    }

    async fn generate_briefing(&self, sections: &[BriefingSectionInput]) -> Result<String, LlmError> {
        self.chat(
            crate::prompts::briefing_system_prompt(),
            crate::prompts::briefing_user_prompt(sections),
            0.3,
            4096,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_used_when_none_given() {
        let p = OpenAiProvider::new("key".into(), "gpt-4o-mini".into(), None);
        assert_eq!(p.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn custom_endpoint_overrides_default() {
        let p = OpenAiProvider::new("key".into(), "model".into(), Some("https://openrouter.ai/api/v1".into()));
        assert_eq!(p.endpoint, "https://openrouter.ai/api/v1");
    }
}
