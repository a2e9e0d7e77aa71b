//! Shared environment configuration for every ingestion worker binary
//!. Each binary reads the same base set of vars; workers
//! that need extra per-type config parse their own on top.

use std::collections::HashMap;
use std::time::Duration;

use newsloom_common::config::{optional_env, optional_env_parsed, required_env};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub user_agent: String,
    /// Default rate spec applied to any domain without an explicit entry.
    pub default_rate_spec: String,
    /// Per-domain overrides, parsed from `RATE_LIMIT_MAP`.
    pub rate_limit_overrides: HashMap<String, String>,
    /// Run once and exit, instead of looping forever on `fetch_interval`.
    pub once: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            redis_url: required_env("REDIS_URL"),
            user_agent: optional_env("NEWSLOOM_USER_AGENT", "newsloom-ingest/0.1"),
            default_rate_spec: optional_env("RATE_LIMIT_DEFAULT", "1/sec"),
            rate_limit_overrides: parse_rate_limit_map(&optional_env("RATE_LIMIT_MAP", "")),
            once: std::env::var("NEWSLOOM_RUN_ONCE").map(|v| v == "1" || v == "true").unwrap_or(false),
        }
    }
}

/// Parse `"reddit.com=10/min,news.ycombinator.com=30/min"` into a map.
/// Malformed entries (missing `=`) are skipped with a warning, not fatal —
/// the worker should still start with whatever parsed.
fn parse_rate_limit_map(raw: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match entry.split_once('=') {
            Some((domain, spec)) => {
                map.insert(domain.trim().to_string(), spec.trim().to_string());
            }
            None => tracing::warn!(entry, "ignoring malformed RATE_LIMIT_MAP entry"),
        }
    }
    map
}

/// Syndication and forum pollers run every 30 minutes, the aggregator every
/// 15, forge releases hourly.
pub fn fetch_interval(default_secs: u64) -> Duration {
    Duration::from_secs(optional_env_parsed("NEWSLOOM_FETCH_INTERVAL_SECS", default_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_map() {
        let map = parse_rate_limit_map("reddit.com=10/min,news.ycombinator.com=30/min");
        assert_eq!(map.get("reddit.com"), Some(&"10/min".to_string()));
        assert_eq!(map.get("news.ycombinator.com"), Some(&"30/min".to_string()));
    }

    #[test]
    fn skips_malformed_entries() {
        let map = parse_rate_limit_map("valid.com=5/sec,not-valid,another.com=1/sec");
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("valid.com"));
        assert!(map.contains_key("another.com"));
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(parse_rate_limit_map("").is_empty());
    }
}
