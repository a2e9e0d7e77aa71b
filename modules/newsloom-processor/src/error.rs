#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Store(#[from] newsloom_store::StoreError),

    #[error(transparent)]
    EventBus(#[from] newsloom_eventbus::EventBusError),

    #[error(transparent)]
    Embedding(#[from] newsloom_embed::EmbeddingError),

    #[error(transparent)]
    Relevance(#[from] newsloom_relevance::RelevanceError),

    #[error("malformed event payload: {0}")]
    BadPayload(String),
}
