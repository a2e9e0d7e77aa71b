use thiserror::Error;

/// Umbrella error used where a caller wants one type to match on across
/// crate boundaries (e.g. the processor, which touches store/embed/cache
/// errors in the same function). Individual crates expose their own
/// `thiserror` enums for precise matching; this just gives them a common
/// `From` target so `?` works end to end in binaries.
#[derive(Error, Debug)]
pub enum NewsloomError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("external service unreachable: {0}")]
    Unreachable(String),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
