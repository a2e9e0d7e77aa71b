#[derive(Debug, thiserror::Error)]
pub enum RelevanceError {
    #[error("store error: {0}")]
    Store(#[from] newsloom_store::StoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] newsloom_embed::EmbeddingError),

    #[error("no enabled sections to evaluate against")]
    NoSections,
}
