#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Store(#[from] newsloom_store::StoreError),

    #[error("invalid cron schedule {0:?}: {1}")]
    BadSchedule(String, String),
}
