//! OTP session storage.
//!
//! Sessions live only in the store; nothing else reads or writes them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cache::{Cache, OtpCheck};
use crate::domain::{OtpCode, OtpKey};
use crate::errors::AppResult;

/// TTL-backed storage for issued codes.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store `code` under `key` for `ttl`, replacing any previous code.
    async fn save(&self, key: &OtpKey, code: &OtpCode, ttl: Duration) -> AppResult<()>;

    /// Delete the entry if it holds `code`. Mismatches leave it untouched.
    async fn consume(&self, key: &OtpKey, code: &str) -> AppResult<OtpCheck>;
}

#[async_trait]
impl OtpStore for Cache {
    async fn save(&self, key: &OtpKey, code: &OtpCode, ttl: Duration) -> AppResult<()> {
        self.store_otp(key.as_str(), code.as_str(), ttl.as_secs().max(1))
            .await
    }

    async fn consume(&self, key: &OtpKey, code: &str) -> AppResult<OtpCheck> {
        self.consume_otp(key.as_str(), code).await
    }
}

/// Process-local store, used for tests and single-node development.
#[derive(Default)]
pub struct InMemoryOtpStore {
    entries: Mutex<HashMap<OtpKey, (String, Instant)>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) sessions.
    pub async fn live_sessions(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn save(&self, key: &OtpKey, code: &OtpCode, ttl: Duration) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.clone(), (code.as_str().to_string(), now + ttl));
        Ok(())
    }

    async fn consume(&self, key: &OtpKey, code: &str) -> AppResult<OtpCheck> {
        let mut entries = self.entries.lock().await;

        let Some((stored, expires_at)) = entries.get(key) else {
            return Ok(OtpCheck::Missing);
        };

        if *expires_at <= Instant::now() {
            entries.remove(key);
            return Ok(OtpCheck::Missing);
        }

        if stored != code {
            return Ok(OtpCheck::Mismatch);
        }

        entries.remove(key);
        Ok(OtpCheck::Consumed)
    }
}
