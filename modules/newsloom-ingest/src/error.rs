#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("initialization failed: {0}")]
    Init(String),

    #[error(transparent)]
    Store(#[from] newsloom_store::StoreError),

    #[error(transparent)]
    Cache(#[from] newsloom_cache::CacheError),

    #[error(transparent)]
    RateLimit(#[from] newsloom_ratelimit::RateLimitError),

    #[error(transparent)]
    EventBus(#[from] newsloom_eventbus::EventBusError),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    FeedParse(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl IngestError {
    /// Per-source errors never abort a worker run; this is
    /// just a readable label for the `last_error` column.
    pub fn source_message(&self) -> String {
        self.to_string()
    }
}
