use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Cache(#[from] newsloom_cache::CacheError),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("domain '{0}' is backed off for another {1:?}")]
    BackedOff(String, Duration),

    #[error("empty host")]
    EmptyHost,

    #[error("invalid rate spec: {0}")]
    InvalidRateSpec(String),
}
