//! Per-domain token bucket, shared across worker processes through the
//! cache. The bucket math mirrors a classic in-memory token
//! bucket (capacity = rate, refill continuously) but the check-and-take is
//! done inside a single Lua script so concurrent workers never race past
//! the limit.

use std::time::Duration;

use newsloom_cache::Cache;
use rand::Rng;
use redis::Script;

use crate::error::RateLimitError;
use crate::rate_spec::parse_rate_spec;

const BACKOFF_CAP: Duration = Duration::from_secs(3600);
const BACKOFF_ATTEMPT_TTL: Duration = Duration::from_secs(24 * 3600);

// KEYS[1] = bucket key, ARGV[1] = capacity, ARGV[2] = refill_per_sec,
// ARGV[3] = now (float seconds), ARGV[4] = bucket TTL seconds.
// Returns the wait time in seconds (0 if a token was taken).
const TOKEN_BUCKET_SCRIPT: &str = r#"
local bucket_key = KEYS[1]
local capacity = tonumber(ARGV[1])
local refill_rate = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local data = redis.call("HMGET", bucket_key, "tokens", "last_refill")
local tokens = tonumber(data[1])
local last_refill = tonumber(data[2])

if tokens == nil then
    tokens = capacity
    last_refill = now
end

local elapsed = now - last_refill
if elapsed < 0 then
    elapsed = 0
end
tokens = math.min(capacity, tokens + elapsed * refill_rate)

local wait = 0
if tokens >= 1 then
    tokens = tokens - 1
else
    wait = (1 - tokens) / refill_rate
end

redis.call("HSET", bucket_key, "tokens", tokens, "last_refill", now)
redis.call("EXPIRE", bucket_key, ttl)

return tostring(wait)
"#;

#[derive(Clone, Copy)]
struct BucketParams {
    capacity: u64,
    refill_rate: f64,
    bucket_ttl: Duration,
}

impl BucketParams {
    fn from_spec(capacity: u64, period: Duration) -> Self {
        Self {
            capacity,
            refill_rate: capacity as f64 / period.as_secs_f64(),
            bucket_ttl: (period * 2).max(Duration::from_secs(60)),
        }
    }
}

/// Token-bucket limiter with per-domain error backoff, backed by a shared
/// cache so every ingestion worker process observes the same state.
#[derive(Clone)]
pub struct RateLimiter {
    cache: Cache,
    default: BucketParams,
    overrides: std::collections::HashMap<String, BucketParams>,
}

impl RateLimiter {
    /// `default_rate_spec` is a `"N/sec"|"N/min"|"N/hour"` string; construction fails fast if it doesn't parse.
    pub fn new(cache: Cache, default_rate_spec: &str) -> Result<Self, RateLimitError> {
        let (capacity, period) = parse_rate_spec(default_rate_spec)
            .map_err(|e| RateLimitError::InvalidRateSpec(e.to_string()))?;
        Ok(Self {
            cache,
            default: BucketParams::from_spec(capacity, period),
            overrides: std::collections::HashMap::new(),
        })
    }

    /// Construct with a per-domain rate-spec map layered over the default
    ///.
    /// Domains absent from `overrides`, or whose spec fails to parse, fall
    /// back to `default_rate_spec`.
    pub fn with_overrides(
        cache: Cache,
        default_rate_spec: &str,
        overrides: &std::collections::HashMap<String, String>,
    ) -> Result<Self, RateLimitError> {
        let mut limiter = Self::new(cache, default_rate_spec)?;
        for (domain, spec) in overrides {
            if domain == "default" {
                continue;
            }
            match parse_rate_spec(spec) {
                Ok((capacity, period)) => {
                    limiter.overrides.insert(domain.clone(), BucketParams::from_spec(capacity, period));
                }
                Err(e) => tracing::warn!(domain, spec, error = %e, "ignoring unparseable rate spec override"),
            }
        }
        Ok(limiter)
    }

    fn params_for(&self, domain: &str) -> BucketParams {
        self.overrides.get(domain).copied().unwrap_or(self.default)
    }

    fn bucket_key(domain: &str) -> String {
        format!("ratelimit:{domain}")
    }

    fn backoff_key(domain: &str) -> String {
        format!("backoff:{domain}")
    }

    fn backoff_count_key(domain: &str) -> String {
        format!("backoff_count:{domain}")
    }

    /// Block until a token is available for `domain`, honoring any active
    /// backoff window first.
    pub async fn wait(&self, domain: &str) -> Result<(), RateLimitError> {
        self.wait_impl(domain, false).await
    }

    /// Like `wait`, but for domains used to fetch arbitrary third-party
    /// content (readable-content extraction): after a token is
    /// successfully taken, adds 1-3s of uniform jitter so many concurrent
    /// workers extracting from diverse hosts don't all fire in the same
    /// instant.
    pub async fn wait_content(&self, domain: &str) -> Result<(), RateLimitError> {
        self.wait_impl(domain, true).await
    }

    async fn wait_impl(&self, domain: &str, jitter_on_success: bool) -> Result<(), RateLimitError> {
        if domain.is_empty() {
            return Err(RateLimitError::EmptyHost);
        }

        loop {
            if let Some(remaining) = self.backoff_remaining(domain).await? {
                tokio::time::sleep(remaining).await;
                continue;
            }

            let wait_secs = self.take_token(domain).await?;
            if wait_secs <= 0.0 {
                if jitter_on_success {
                    let jitter = Duration::from_millis(rand::rng().random_range(1000..=3000));
                    tokio::time::sleep(jitter).await;
                }
                return Ok(());
            }

            tokio::time::sleep(Duration::from_secs_f64(wait_secs)).await;
        }
    }

    /// Non-blocking check: would `wait` return immediately right now?
    pub async fn allow(&self, domain: &str) -> Result<bool, RateLimitError> {
        if self.backoff_remaining(domain).await?.is_some() {
            return Ok(false);
        }
        Ok(self.take_token(domain).await? <= 0.0)
    }

    async fn take_token(&self, domain: &str) -> Result<f64, RateLimitError> {
        let params = self.params_for(domain);
        let now = now_secs();
        let script = Script::new(TOKEN_BUCKET_SCRIPT);
        let key = Self::bucket_key(domain);
        let result: String = self
            .cache
            .eval(
                &script,
                &[&key],
                &[
                    params.capacity.to_string(),
                    params.refill_rate.to_string(),
                    now.to_string(),
                    params.bucket_ttl.as_secs().to_string(),
                ],
            )
            .await?;
        Ok(result.parse().unwrap_or(0.0))
    }

    async fn backoff_remaining(&self, domain: &str) -> Result<Option<Duration>, RateLimitError> {
        let key = Self::backoff_key(domain);
        match self.cache.get(&key).await? {
            Some(deadline_str) => {
                let deadline: f64 = deadline_str.parse().unwrap_or(0.0);
                let now = now_secs();
                if deadline > now {
                    Ok(Some(Duration::from_secs_f64(deadline - now)))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Record a failed fetch. Only `429`/`403` arm a backoff window; any
    /// other status (or a transport-level failure with no status at all)
    /// is a plain per-item fetch failure and must not block the rest of
    /// the domain. Sets (or extends) a backoff window: honor `retry_after`
    /// if the server gave one, otherwise double from the previous
    /// attempt's wait, capped at one hour.
    pub async fn record_error(
        &self,
        domain: &str,
        status: Option<u16>,
        retry_after: Option<Duration>,
    ) -> Result<(), RateLimitError> {
        if !matches!(status, Some(429) | Some(403)) {
            return Ok(());
        }

        let attempt = self
            .cache
            .incr_with_ttl(&Self::backoff_count_key(domain), BACKOFF_ATTEMPT_TTL)
            .await?;

        let backoff = match retry_after {
            Some(d) => d,
            None => {
                let base = Duration::from_secs(30);
                let exp = 2u32.saturating_pow((attempt.max(1) - 1) as u32);
                base.saturating_mul(exp).min(BACKOFF_CAP)
            }
        };

        tracing::warn!(domain, ?status, attempt, backoff_secs = backoff.as_secs(), "backing off domain");

        let deadline = now_secs() + backoff.as_secs_f64();
        self.cache
            .set(&Self::backoff_key(domain), &deadline.to_string(), backoff)
            .await?;
        Ok(())
    }

    /// Clear backoff state after a successful fetch.
    pub async fn reset_backoff(&self, domain: &str) -> Result<(), RateLimitError> {
        self.cache.del(&Self::backoff_key(domain)).await?;
        self.cache.del(&Self::backoff_count_key(domain)).await?;
        Ok(())
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
