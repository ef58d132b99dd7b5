//! Connectivity checks for backing services.

use async_trait::async_trait;

use super::{Cache, Database};
use crate::errors::AppResult;

/// A dependency that can report whether it is reachable.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
impl HealthCheck for Database {
    async fn ping(&self) -> AppResult<()> {
        Database::ping(self).await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for Cache {
    async fn ping(&self) -> AppResult<()> {
        self.exists("health:ping").await?;
        Ok(())
    }
}
