use newsloom_common::config::{optional_env, optional_env_parsed, required_env};

pub struct Config {
    pub database_url: String,
    pub llm_provider: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_endpoint: Option<String>,
    pub threshold_default: f64,
    pub threshold_min: f64,
    pub threshold_max: f64,
    /// Cron expression for daemon mode.
    pub schedule: String,
    pub once: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            llm_provider: required_env("LLM_PROVIDER"),
            llm_api_key: required_env("LLM_API_KEY"),
            llm_model: required_env("LLM_MODEL"),
            llm_endpoint: std::env::var("LLM_ENDPOINT").ok().filter(|s| !s.is_empty()),
            threshold_default: optional_env_parsed("RELEVANCE_THRESHOLD_DEFAULT", 0.30),
            threshold_min: optional_env_parsed("RELEVANCE_THRESHOLD_MIN", 0.15),
            threshold_max: optional_env_parsed("RELEVANCE_THRESHOLD_MAX", 0.60),
            schedule: optional_env("BRIEFING_CRON", "0 0 * * * *"),
            once: std::env::var("NEWSLOOM_RUN_ONCE").map(|v| v == "1" || v == "true").unwrap_or(false),
        }
    }
}
