//! Thin async wrapper around a Redis-compatible key-value store.
//!
//! This is the shared cache backing the rate limiter's token-bucket and
//! backoff state (`ratelimit:*`, `backoff:*`, `backoff_count:*`) and the
//! dedup store's recent-seen set (`dedup:*`). It owns no domain knowledge —
//! callers pick keys and TTLs.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Clonable handle to the shared cache. `ConnectionManager` multiplexes
/// internally and reconnects on failure, so every worker/process can hold
/// its own clone without its own pool.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

impl Cache {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// Atomic set-if-absent with TTL. Returns `true` if the key was created
    /// by this call (i.e. it was previously absent).
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let created: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(created.is_some())
    }

    /// Unconditional set with TTL.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    pub async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Increment a counter, setting `ttl` only the first time the key is
    /// created (so a long-lived TTL like the rate limiter's 24h attempt
    /// counter isn't reset by every increment).
    pub async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.incr(key, 1).await?;
        if count == 1 {
            conn.expire::<_, ()>(key, ttl.as_secs() as i64).await?;
        }
        Ok(count)
    }

    /// Evaluate a Lua script against one or more keys. Callers own the
    /// script text; this just plumbs it through the shared connection so
    /// multi-step operations (e.g. a token-bucket check-and-decrement)
    /// stay atomic across processes.
    pub async fn eval<T: redis::FromRedisValue>(
        &self,
        script: &redis::Script,
        keys: &[&str],
        args: &[String],
    ) -> Result<T> {
        let mut conn = self.conn.clone();
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(*key);
        }
        for arg in args {
            invocation.arg(arg);
        }
        Ok(invocation.invoke_async(&mut conn).await?)
    }
}
