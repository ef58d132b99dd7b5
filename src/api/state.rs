//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::infra::{HealthCheck, RateLimiter};
use crate::services::{AuthService, BlacklistService, OtpService, ServiceContainer, UserService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub blacklist_service: Arc<dyn BlacklistService>,
    pub otp_service: Arc<dyn OtpService>,
    /// Counters for per-route limits
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Database health probe
    pub database: Arc<dyn HealthCheck>,
    /// Redis health probe
    pub cache: Arc<dyn HealthCheck>,
    /// Take the client address from forwarding headers
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Build state from a service container.
    pub fn from_container(
        services: &dyn ServiceContainer,
        rate_limiter: Arc<dyn RateLimiter>,
        database: Arc<dyn HealthCheck>,
        cache: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            blacklist_service: services.blacklist(),
            otp_service: services.otp(),
            rate_limiter,
            database,
            cache,
            trust_proxy_headers: false,
        }
    }

    /// Only enable behind a proxy that overwrites `X-Forwarded-For`.
    pub fn with_trusted_proxy(mut self, trusted: bool) -> Self {
        self.trust_proxy_headers = trusted;
        self
    }
}
