use std::time::Duration;

use newsloom_cache::Cache;

use crate::canonicalize::hash;

const DEDUP_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Recent-seen URL set backed by the shared cache, keyed on the
/// canonical-URL hash with a 7-day TTL.
#[derive(Clone)]
pub struct DedupStore {
    cache: Cache,
}

impl DedupStore {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    fn key(url: &str) -> String {
        format!("dedup:{}", hash(url))
    }

    /// Atomic set-if-absent. Returns `true` when the key did not already
    /// exist (i.e. this URL is new within the TTL window).
    pub async fn is_new(&self, url: &str) -> Result<bool, newsloom_cache::CacheError> {
        self.cache.set_if_absent(&Self::key(url), "1", DEDUP_TTL).await
    }

    /// Unconditionally mark a URL seen, refreshing its TTL.
    pub async fn mark_seen(&self, url: &str) -> Result<(), newsloom_cache::CacheError> {
        self.cache.set(&Self::key(url), "1", DEDUP_TTL).await
    }
}
