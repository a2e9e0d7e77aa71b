//! Batched client for the external embedding service. Treated as a black box: `POST {texts}` -> `{embeddings}`.
//! This crate owns batching, retry/backoff, and the cosine-similarity
//! helper used throughout the relevance/feedback/cluster crates — though
//! the canonical copy of `cosine_similarity` lives in `newsloom-common` and
//! is re-exported here for callers that only depend on this crate.

mod error;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use error::EmbeddingError;

/// Inputs larger than this are split into batches.
const MAX_BATCH: usize = 32;
const BATCH_SPLIT_THRESHOLD: usize = 100;

const MAX_ATTEMPTS: u32 = 6;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}

/// Thin client for the embedding service's `POST /embed` endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl EmbeddingClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Embed a set of texts, splitting into batches of at most 32 when the
    /// input exceeds 100. Fails if any batch's returned
    /// vector count disagrees with its input count.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if texts.len() <= BATCH_SPLIT_THRESHOLD {
            return self.embed_batch(texts).await;
        }

        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            out.extend(self.embed_batch(chunk).await?);
        }
        Ok(out)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut attempt = 0u32;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            attempt += 1;
            let result = self.try_embed_batch(texts).await;

            match result {
                Ok(vectors) => {
                    if vectors.len() != texts.len() {
                        return Err(EmbeddingError::CountMismatch {
                            expected: texts.len(),
                            actual: vectors.len(),
                        });
                    }
                    return Ok(vectors);
                }
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        error = %err,
                        backoff_ms = backoff.as_millis(),
                        "embedding batch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .http
            .post(format!("{}/embed", self.endpoint))
            .json(&EmbedRequest { texts })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    EmbeddingError::Unreachable(e.to_string())
                } else {
                    EmbeddingError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        Ok(parsed.embeddings)
    }
}

/// Cosine similarity, zero on empty/mismatched/zero-norm input. Re-exported so consumers of this crate don't need a separate
/// `newsloom-common` dependency just for this one function.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    newsloom_common::cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_retryable_status_matches_spec_list() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(502));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(504));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(500));
    }

    #[test]
    fn cosine_similarity_reexport_matches_common() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }
}
