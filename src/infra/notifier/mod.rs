//! Outbound user notifications.
//!
//! Notifiers are only called from the background notification worker;
//! their errors are logged there and never reach an HTTP response.

mod novu;

use async_trait::async_trait;

use crate::domain::{OtpCode, User};
use crate::errors::AppResult;

pub use novu::NovuClient;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Delivery channel for OTP codes.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Register the user with the provider if it does not know them yet.
    async fn identify(&self, user: &User) -> AppResult<()>;

    /// Deliver `code` to the user.
    async fn send_otp(&self, user: &User, code: &OtpCode) -> AppResult<()>;
}

/// Writes codes to the log. Used when no provider is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn identify(&self, user: &User) -> AppResult<()> {
        tracing::debug!(user_id = %user.id, "Identify skipped, no notification provider");
        Ok(())
    }

    async fn send_otp(&self, user: &User, code: &OtpCode) -> AppResult<()> {
        tracing::info!(
            user_id = %user.id,
            otp = code.as_str(),
            "No notification provider configured, OTP written to log"
        );
        Ok(())
    }
}
