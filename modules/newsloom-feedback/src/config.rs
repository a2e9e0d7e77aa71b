use newsloom_common::config::{optional_env, optional_env_parsed, required_env};

use crate::TriggerMode;

pub struct Config {
    pub database_url: String,
    pub embedding_service_url: String,
    pub trigger_mode: TriggerMode,
    /// Seconds between periodic recomputation passes.
    pub recompute_interval_secs: u64,
    pub once: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            embedding_service_url: required_env("EMBEDDING_SERVICE_URL"),
            trigger_mode: TriggerMode::parse(&optional_env("FEEDBACK_TRIGGER_MODE", "immediate")),
            recompute_interval_secs: optional_env_parsed("FEEDBACK_RECOMPUTE_INTERVAL_SECS", 3600),
            once: std::env::var("NEWSLOOM_RUN_ONCE").map(|v| v == "1" || v == "true").unwrap_or(false),
        }
    }
}
