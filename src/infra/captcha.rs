//! Captcha token verification.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::CaptchaConfig;
use crate::errors::{AppError, AppResult};

/// Checks a client-supplied captcha token.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(false)` means the provider rejected the token.
    async fn verify(&self, token: &str) -> AppResult<bool>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// reCAPTCHA `siteverify` client. hCaptcha exposes the same contract.
pub struct ReCaptchaVerifier {
    client: Client,
    config: CaptchaConfig,
}

impl ReCaptchaVerifier {
    pub fn new(config: CaptchaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for ReCaptchaVerifier {
    async fn verify(&self, token: &str) -> AppResult<bool> {
        let response = self
            .client
            .post(&self.config.verify_url)
            .form(&[("secret", self.config.secret()), ("response", token)])
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Captcha request failed: {}", e)))?;

        let body: SiteVerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Captcha response invalid: {}", e)))?;

        if !body.success {
            tracing::debug!(errors = ?body.error_codes, "Captcha rejected");
        }

        Ok(body.success)
    }
}
