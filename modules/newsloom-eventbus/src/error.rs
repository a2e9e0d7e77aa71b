#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("failed to connect after retrying: {0}")]
    Connect(sqlx::Error),
}
