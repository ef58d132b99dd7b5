//! Redis cache.
//!
//! Holds OTP sessions and rate limit counters. Every read-modify-write
//! runs as a single Lua script so concurrent requests see one outcome.
//! Scripts are sent by SHA and loaded on the first miss.

use once_cell::sync::Lazy;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, Script};

use crate::config::{Config, CACHE_PREFIX_RATE_LIMIT};
use crate::errors::{AppError, AppResult};

/// Result of checking a submitted code against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// No entry under the key (never issued, expired or already used)
    Missing,
    /// Entry exists but holds a different code; it is left in place
    Mismatch,
    /// Entry matched and was deleted
    Consumed,
}

/// Delete the key only when it holds the submitted code.
/// Returns -1 when missing, 0 on mismatch, 1 when consumed.
static CONSUME_OTP_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
    local stored = redis.call("GET", KEYS[1])
    if not stored then
        return -1
    end
    if stored == ARGV[1] then
        redis.call("DEL", KEYS[1])
        return 1
    end
    return 0
"#,
    )
});

/// Increment a window counter, starting the window on the first hit.
static RATE_LIMIT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
    local count = redis.call("INCR", KEYS[1])
    if count == 1 then
        redis.call("EXPIRE", KEYS[1], ARGV[1])
    end
    return count
"#,
    )
});

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::open(config.redis_url.as_str()).map_err(cache_error)?;
        let connection = ConnectionManager::new(client).await.map_err(cache_error)?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }

    /// Check if a key exists in cache.
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await.map_err(cache_error)?;
        Ok(exists)
    }

    // =========================================================================
    // OTP Sessions
    // =========================================================================

    /// Store an OTP under `key`, replacing any previous value.
    pub async fn store_otp(&self, key: &str, code: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, code, ttl_seconds)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    /// Compare and delete in one step.
    pub async fn consume_otp(&self, key: &str, code: &str) -> AppResult<OtpCheck> {
        let mut conn = self.connection.clone();

        let result: i64 = CONSUME_OTP_SCRIPT
            .key(key)
            .arg(code)
            .invoke_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok(match result {
            1 => OtpCheck::Consumed,
            0 => OtpCheck::Mismatch,
            _ => OtpCheck::Missing,
        })
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Count a hit for `identifier` and report the count within the window.
    pub async fn hit_rate_limit(&self, identifier: &str, window_seconds: u64) -> AppResult<u64> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let count: i64 = RATE_LIMIT_SCRIPT
            .key(&key)
            .arg(window_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok(count.max(0) as u64)
    }
}

fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::Cache(e)
}
