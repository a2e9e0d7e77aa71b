pub mod error;
pub mod limiter;
pub mod rate_spec;
pub mod transport;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use error::RateLimitError;
pub use limiter::RateLimiter;
pub use rate_spec::{format_rate_spec, parse_rate_spec};
pub use transport::RateLimitedTransport;
