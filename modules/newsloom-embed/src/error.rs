#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("embedding service unreachable: {0}")]
    Unreachable(String),

    #[error("embedding service returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("embedding service returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// Network errors and the spec's retryable HTTP codes (429/502/503/504)
    /// are retried; anything else fails the batch immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Unreachable(_) => true,
            EmbeddingError::Transport(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::Provider { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            EmbeddingError::CountMismatch { .. } => false,
        }
    }
}
