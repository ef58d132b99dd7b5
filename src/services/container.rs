//! Service Container - centralized service construction and access.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, BlacklistManager, BlacklistService, OtpManager, OtpService,
    UserManager, UserService,
};
use crate::config::Config;
use crate::infra::{OtpStore, Persistence, ReCaptchaVerifier};
use crate::jobs::NotificationQueue;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get blacklist service
    fn blacklist(&self) -> Arc<dyn BlacklistService>;

    /// Get OTP service
    fn otp(&self) -> Arc<dyn OtpService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    blacklist_service: Arc<dyn BlacklistService>,
    otp_service: Arc<dyn OtpService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        blacklist_service: Arc<dyn BlacklistService>,
        otp_service: Arc<dyn OtpService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            blacklist_service,
            otp_service,
        }
    }

    /// Wire every service over a database connection.
    pub fn from_parts(
        db: sea_orm::DatabaseConnection,
        otp_store: Arc<dyn OtpStore>,
        notifications: NotificationQueue,
        config: Config,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        let blacklist_service: Arc<dyn BlacklistService> =
            Arc::new(BlacklistManager::new(uow.clone()));
        let otp_service: Arc<dyn OtpService> = Arc::new(OtpManager::new(
            uow.clone(),
            otp_store,
            blacklist_service.clone(),
            notifications.clone(),
            config.otp_ttl(),
        ));

        let mut authenticator = Authenticator::new(
            uow.clone(),
            blacklist_service.clone(),
            otp_service.clone(),
            notifications,
            config.clone(),
        );
        if let Some(captcha) = config.captcha.clone() {
            authenticator = authenticator.with_captcha(Arc::new(ReCaptchaVerifier::new(captcha)));
        }

        Self {
            auth_service: Arc::new(authenticator),
            user_service: Arc::new(UserManager::new(uow)),
            blacklist_service,
            otp_service,
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn blacklist(&self) -> Arc<dyn BlacklistService> {
        self.blacklist_service.clone()
    }

    fn otp(&self) -> Arc<dyn OtpService> {
        self.otp_service.clone()
    }
}
