//! Fixed-window rate limit counters.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cache::Cache;
use crate::errors::{AppError, AppResult};

/// Shared counter keyed by action and client.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Atomically count one hit and return the count in the current window.
    async fn hit(&self, key: &str, window_seconds: u64) -> AppResult<u64>;
}

#[async_trait]
impl RateLimiter for Cache {
    async fn hit(&self, key: &str, window_seconds: u64) -> AppResult<u64> {
        self.hit_rate_limit(key, window_seconds).await
    }
}

/// A named limit: at most `max_requests` per `window_seconds`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub action: &'static str,
    pub max_requests: u64,
    pub window_seconds: u64,
}

impl RateLimit {
    pub const fn new(action: &'static str, max_requests: u64, window_seconds: u64) -> Self {
        Self {
            action,
            max_requests,
            window_seconds,
        }
    }

    /// Count a hit for `client` and fail once the limit is exceeded.
    ///
    /// Counter failures deny the request.
    pub async fn enforce(&self, limiter: &dyn RateLimiter, client: &str) -> AppResult<()> {
        let key = format!("{}:{}", self.action, client);

        let count = match limiter.hit(&key, self.window_seconds).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, action = self.action, "Rate limit check failed - denying request");
                return Err(AppError::TooManyRequests);
            }
        };

        if count > self.max_requests {
            tracing::warn!(
                action = self.action,
                client = %client,
                count = count,
                "Rate limit exceeded"
            );
            return Err(AppError::TooManyRequests);
        }

        Ok(())
    }
}

/// Process-local counters, used for tests and single-node development.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    windows: Mutex<HashMap<String, (u64, Instant)>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn hit(&self, key: &str, window_seconds: u64) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        windows.retain(|_, (_, reset_at)| *reset_at > now);

        let entry = windows
            .entry(key.to_string())
            .or_insert((0, now + Duration::from_secs(window_seconds)));

        entry.0 += 1;

        Ok(entry.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: RateLimit = RateLimit::new("otp", 2, 60);

    struct BrokenLimiter;

    #[async_trait]
    impl RateLimiter for BrokenLimiter {
        async fn hit(&self, _key: &str, _window_seconds: u64) -> AppResult<u64> {
            Err(AppError::ServiceUnavailable("redis".to_string()))
        }
    }

    #[tokio::test]
    async fn test_limit_exceeded() {
        let limiter = InMemoryRateLimiter::new();

        assert!(LIMIT.enforce(&limiter, "10.0.0.1").await.is_ok());
        assert!(LIMIT.enforce(&limiter, "10.0.0.1").await.is_ok());
        assert!(matches!(
            LIMIT.enforce(&limiter, "10.0.0.1").await,
            Err(AppError::TooManyRequests)
        ));
    }

    #[tokio::test]
    async fn test_clients_counted_separately() {
        let limiter = InMemoryRateLimiter::new();

        for _ in 0..2 {
            LIMIT.enforce(&limiter, "10.0.0.1").await.unwrap();
        }
        assert!(LIMIT.enforce(&limiter, "10.0.0.2").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = InMemoryRateLimiter::new();

        for _ in 0..2 {
            LIMIT.enforce(&limiter, "10.0.0.1").await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(LIMIT.enforce(&limiter, "10.0.0.1").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_windows_are_dropped() {
        let limiter = InMemoryRateLimiter::new();

        for i in 0..20 {
            limiter.hit(&format!("otp:10.0.0.{}", i), 60).await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.hit("otp:10.0.0.99", 60).await.unwrap();

        assert_eq!(limiter.windows.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_fails_closed() {
        assert!(matches!(
            LIMIT.enforce(&BrokenLimiter, "10.0.0.1").await,
            Err(AppError::TooManyRequests)
        ));
    }
}
