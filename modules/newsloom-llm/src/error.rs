#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("llm provider '{provider}' returned {status}: {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("llm response was not valid JSON after stripping code fences: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("llm response had no content")]
    EmptyResponse,

    #[error("request timed out")]
    Timeout,

    #[error("unknown llm provider identifier: {0}")]
    UnknownProvider(String),

    #[error("configuration error: {0}")]
    Config(String),
}
