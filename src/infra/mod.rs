//! Infrastructure layer - External systems integration
//!
//! - Database connections and repositories
//! - Redis-backed OTP sessions and rate limit counters
//! - Notification provider and captcha clients

pub mod cache;
pub mod captcha;
pub mod db;
pub mod health;
pub mod notifier;
pub mod otp_store;
pub mod rate_limit;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{Cache, OtpCheck};
pub use captcha::{CaptchaVerifier, ReCaptchaVerifier};
pub use db::{Database, Migrator};
pub use health::HealthCheck;
pub use notifier::{LogNotifier, Notifier, NovuClient};
pub use otp_store::{InMemoryOtpStore, OtpStore};
pub use rate_limit::{InMemoryRateLimiter, RateLimit, RateLimiter};
pub use repositories::{BlacklistRepository, BlacklistStore, UserRepository, UserStore};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use notifier::MockNotifier;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockBlacklistRepository, MockUserRepository};
