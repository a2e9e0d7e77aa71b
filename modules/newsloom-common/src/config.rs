//! Environment-variable configuration helpers shared by every binary's
//! `Config::from_env`. Each binary family (ingestion workers, processor,
//! composer) owns its own `Config` struct in its own crate; this just
//! centralizes the "missing required var panics with a clear message" /
//! "optional var falls back to a default" idioms so they read identically
//! everywhere.

use std::env;

/// Read a required environment variable. Panics with a clear message if
/// unset — configuration errors are fatal at startup.
pub fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

/// Read an optional environment variable, falling back to `default`.
pub fn optional_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an optional environment variable, falling back to
/// `default` if unset or unparseable.
pub fn optional_env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Log the presence and length (never the value) of a set of sensitive
/// environment variables, for startup diagnostics without leaking secrets.
pub fn log_redacted(vars: &[(&str, &str)]) {
    for (name, value) in vars {
        if value.is_empty() {
            tracing::info!("{name} = (empty)");
        } else {
            tracing::info!("{name} = ({} chars)", value.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_env_missing_uses_default() {
        assert_eq!(optional_env("NEWSLOOM_TEST_DOES_NOT_EXIST", "fallback"), "fallback");
    }

    #[test]
    fn optional_env_parsed_missing_uses_default() {
        let v: u64 = optional_env_parsed("NEWSLOOM_TEST_DOES_NOT_EXIST_NUM", 42);
        assert_eq!(v, 42);
    }

    #[test]
    fn optional_env_parsed_unparseable_uses_default() {
        std::env::set_var("NEWSLOOM_TEST_BAD_NUM", "not-a-number");
        let v: u64 = optional_env_parsed("NEWSLOOM_TEST_BAD_NUM", 7);
        assert_eq!(v, 7);
        std::env::remove_var("NEWSLOOM_TEST_BAD_NUM");
    }
}
