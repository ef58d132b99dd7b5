//! OTP service - issues and verifies one-time passcodes.
//!
//! A request stores a fresh code under `otp:{email}:{session_id}` and hands
//! delivery to the notification queue. Verification consumes the entry
//! only when the submitted code matches.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::BlacklistService;
use crate::config::OTP_LENGTH;
use crate::domain::{OtpCode, OtpKey, User};
use crate::errors::{AppError, AppResult};
use crate::infra::{OtpCheck, OtpStore, UnitOfWork};
use crate::jobs::{NotificationJob, NotificationQueue};

/// OTP service trait for dependency injection.
#[async_trait]
pub trait OtpService: Send + Sync {
    /// Issue a code for a registered, non-blacklisted email and return the
    /// session id that correlates the later verification.
    async fn request_otp(&self, email: &str) -> AppResult<Uuid>;

    /// Check and consume a code, returning the user it was issued for.
    async fn verify_otp(&self, email: &str, session_id: &str, code: &str) -> AppResult<User>;
}

/// Concrete implementation of OtpService.
pub struct OtpManager<U: UnitOfWork> {
    uow: Arc<U>,
    store: Arc<dyn OtpStore>,
    blacklist: Arc<dyn BlacklistService>,
    notifications: NotificationQueue,
    ttl: Duration,
}

impl<U: UnitOfWork> OtpManager<U> {
    pub fn new(
        uow: Arc<U>,
        store: Arc<dyn OtpStore>,
        blacklist: Arc<dyn BlacklistService>,
        notifications: NotificationQueue,
        ttl: Duration,
    ) -> Self {
        Self {
            uow,
            store,
            blacklist,
            notifications,
            ttl,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> OtpService for OtpManager<U> {
    async fn request_otp(&self, email: &str) -> AppResult<Uuid> {
        self.blacklist.check_email(email).await?;

        let user = self
            .uow
            .users()
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let session_id = Uuid::new_v4();
        let code = OtpCode::generate(OTP_LENGTH);
        let key = OtpKey::new(email, session_id);

        self.store.save(&key, &code, self.ttl).await?;

        tracing::info!(user_id = %user.id, session_id = %session_id, "OTP issued");

        self.notifications
            .enqueue(NotificationJob::SendOtp { user, code });

        Ok(session_id)
    }

    async fn verify_otp(&self, email: &str, session_id: &str, code: &str) -> AppResult<User> {
        if email.is_empty() || session_id.is_empty() || code.is_empty() {
            return Err(AppError::validation("Missing data"));
        }

        // An unparseable id can never have been issued.
        let session_id = Uuid::parse_str(session_id).map_err(|_| AppError::OtpExpired)?;
        let key = OtpKey::new(email, session_id);

        match self.store.consume(&key, code).await? {
            OtpCheck::Missing => return Err(AppError::OtpExpired),
            OtpCheck::Mismatch => {
                tracing::info!(session_id = %session_id, "OTP mismatch");
                return Err(AppError::OtpMismatch);
            }
            OtpCheck::Consumed => {}
        }

        let user = self
            .uow
            .users()
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(user_id = %user.id, session_id = %session_id, "OTP verified");
        Ok(user)
    }
}
