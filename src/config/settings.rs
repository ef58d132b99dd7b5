//! Application settings loaded from environment variables.

use std::env;
use std::time::Duration;

use super::constants::{
    DEFAULT_CAPTCHA_VERIFY_URL, DEFAULT_DATABASE_URL, DEFAULT_JWT_EXPIRATION_HOURS,
    DEFAULT_NOTIFICATION_QUEUE_CAPACITY, DEFAULT_NOVU_API_URL, DEFAULT_NOVU_OTP_TEMPLATE,
    DEFAULT_NOVU_TIMEOUT_SECONDS, DEFAULT_OTP_TTL_SECONDS, DEFAULT_REDIS_URL, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH,
};

/// Novu notification provider settings.
///
/// Only present when `NOVU_API_KEY` is set; without it OTP codes are
/// written to the log instead of being delivered.
#[derive(Clone)]
pub struct NovuConfig {
    pub api_url: String,
    api_key: String,
    pub otp_template: String,
    pub timeout: Duration,
}

impl NovuConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            otp_template: DEFAULT_NOVU_OTP_TEMPLATE.to_string(),
            timeout: Duration::from_secs(DEFAULT_NOVU_TIMEOUT_SECONDS),
        }
    }

    /// API key sent in the `Authorization: ApiKey ...` header.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for NovuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NovuConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("otp_template", &self.otp_template)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Captcha verification settings.
#[derive(Clone)]
pub struct CaptchaConfig {
    pub verify_url: String,
    secret: String,
}

impl CaptchaConfig {
    pub fn new(verify_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            verify_url: verify_url.into(),
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("verify_url", &self.verify_url)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub otp_ttl_seconds: u64,
    pub novu: Option<NovuConfig>,
    pub captcha: Option<CaptchaConfig>,
    pub notification_queue_capacity: usize,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for the client address
    pub trust_proxy_headers: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("otp_ttl_seconds", &self.otp_ttl_seconds)
            .field("novu", &self.novu)
            .field("captcha", &self.captcha)
            .field("notification_queue_capacity", &self.notification_queue_capacity)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish()
    }
}

impl Config {
    /// Configuration with development defaults and the given signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            novu: None,
            captcha: None,
            notification_queue_capacity: DEFAULT_NOTIFICATION_QUEUE_CAPACITY,
            trust_proxy_headers: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let novu = env::var("NOVU_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(|api_key| {
                let mut novu = NovuConfig::new(
                    env::var("NOVU_API_URL").unwrap_or_else(|_| DEFAULT_NOVU_API_URL.to_string()),
                    api_key,
                );
                if let Ok(template) = env::var("NOVU_OTP_TEMPLATE") {
                    novu.otp_template = template;
                }
                if let Some(secs) = parse_var::<u64>("NOVU_TIMEOUT_SECONDS") {
                    novu.timeout = Duration::from_secs(secs);
                }
                novu
            });

        let captcha = env::var("CAPTCHA_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .map(|secret| {
                CaptchaConfig::new(
                    env::var("CAPTCHA_VERIFY_URL")
                        .unwrap_or_else(|_| DEFAULT_CAPTCHA_VERIFY_URL.to_string()),
                    secret,
                )
            });

        let defaults = Self::new(jwt_secret);

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS")
                .unwrap_or(defaults.jwt_expiration_hours),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            otp_ttl_seconds: parse_var("OTP_TTL_SECONDS").unwrap_or(defaults.otp_ttl_seconds),
            novu,
            captcha,
            notification_queue_capacity: parse_var("NOTIFICATION_QUEUE_CAPACITY")
                .unwrap_or(defaults.notification_queue_capacity),
            trust_proxy_headers: parse_var("TRUST_PROXY_HEADERS")
                .unwrap_or(defaults.trust_proxy_headers),
            jwt_secret: defaults.jwt_secret,
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Lifetime of an issued OTP session.
    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_seconds)
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
