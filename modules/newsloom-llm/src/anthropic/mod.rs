//! Anthropic-style "messages" adapter: distinct auth header
//! (`x-api-key` + `anthropic-version`) and a system/messages split instead
//! of a system role inside the message array.

mod types;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::{util, BriefingSectionInput, ClassifyInput, ClassifyResult, LlmError, LlmProvider, SummarizeInput, REQUEST_TIMEOUT};

use types::{MessagesRequest, MessagesResponse, WireMessage};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicProvider {
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
            "x-api-key",
            HeaderValue::from_str(&self.api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn messages(&self, system: String, user: String, max_tokens: u32) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            system,
            messages: vec![WireMessage::user(user)],
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/messages", self.endpoint))
            .headers(self.headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::Transport(e) })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider { provider: "anthropic", status: status.as_u16(), body });
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn classify(&self, articles: &[ClassifyInput]) -> Result<Vec<ClassifyResult>, LlmError> {
        let raw = self
            .messages(
                crate::prompts::classify_system_prompt(),
                crate::prompts::classify_user_prompt(articles),
                2048,
            )
            .await?;
        let stripped = util::strip_code_blocks(&raw);
        Ok(serde_json::from_str(stripped)?)
    }

    async fn summarize(&self, input: &SummarizeInput) -> Result<String, LlmError> {
        self.messages(crate::prompts::summarize_system_prompt(), crate::prompts::summarize_user_prompt(input), 300)
            .await
            .map(|s| s.trim().to_string())
    }

    async fn generate_briefing(&self, sections: &[BriefingSectionInput]) -> Result<String, LlmError> {
        self.messages(crate::prompts::briefing_system_prompt(), crate::prompts::briefing_user_prompt(sections), 4096)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_used_when_none_given() {
        let p = AnthropicProvider::new("key".into(), "claude-sonnet-4-5".into(), None);
        assert_eq!(p.endpoint, DEFAULT_ENDPOINT);
    }
}
