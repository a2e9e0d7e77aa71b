/// Postgres error code for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The row already exists — caller should treat this as "already
    /// seen".
    #[error("unique violation: {0}")]
    UniqueViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Classify a raw `sqlx::Error` into `UniqueViolation` when the underlying
/// Postgres error code says so, else pass it through unchanged.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::UniqueViolation(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}
