use newsloom_common::config::{optional_env, optional_env_parsed, required_env};
use newsloom_relevance::{SourceBoostMap, ThresholdConfig};

pub struct Config {
    pub database_url: String,
    pub embedding_service_url: String,
    pub threshold_config: ThresholdConfig,
    pub source_boost_map: String,
    /// Seconds between pulls when the previous pull returned nothing, so
    /// the processor doesn't spin hot on an empty queue.
    pub idle_poll_interval_secs: u64,
    pub once: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            embedding_service_url: required_env("EMBEDDING_SERVICE_URL"),
            threshold_config: ThresholdConfig {
                default: optional_env_parsed("RELEVANCE_THRESHOLD_DEFAULT", 0.30),
                min: optional_env_parsed("RELEVANCE_THRESHOLD_MIN", 0.15),
                max: optional_env_parsed("RELEVANCE_THRESHOLD_MAX", 0.60),
                step: optional_env_parsed("RELEVANCE_THRESHOLD_STEP", 0.05),
            },
            source_boost_map: optional_env("RELEVANCE_SOURCE_BOOST_MAP", ""),
            idle_poll_interval_secs: optional_env_parsed("NEWSLOOM_IDLE_POLL_INTERVAL_SECS", 5),
            once: std::env::var("NEWSLOOM_RUN_ONCE").map(|v| v == "1" || v == "true").unwrap_or(false),
        }
    }

    pub fn source_boost_map(&self) -> SourceBoostMap {
        SourceBoostMap::parse(&self.source_boost_map)
    }
}
