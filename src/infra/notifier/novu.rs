//! Novu transactional messaging client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::Notifier;
use crate::config::NovuConfig;
use crate::domain::{OtpCode, User};
use crate::errors::{AppError, AppResult};

/// Subscriber upsert body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriberPayload<'a> {
    subscriber_id: String,
    email: &'a str,
    first_name: &'a str,
    phone: String,
}

/// Event trigger body
#[derive(Debug, Serialize)]
struct TriggerPayload<'a> {
    name: &'a str,
    to: TriggerRecipient<'a>,
    payload: OtpPayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRecipient<'a> {
    subscriber_id: String,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OtpPayload<'a> {
    user_name: &'a str,
    otp: &'a str,
}

/// Novu REST API client.
pub struct NovuClient {
    client: Client,
    config: NovuConfig,
}

impl NovuClient {
    pub fn new(config: NovuConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build Novu client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn auth_header(&self) -> String {
        format!("ApiKey {}", self.config.api_key())
    }

    async fn subscriber_exists(&self, subscriber_id: &str) -> AppResult<bool> {
        let response = self
            .client
            .get(self.url(&format!("/v1/subscribers/{}", subscriber_id)))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(provider_error)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(AppError::ServiceUnavailable(format!(
                "Novu subscriber lookup returned {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl Notifier for NovuClient {
    async fn identify(&self, user: &User) -> AppResult<()> {
        let subscriber_id = user.id.to_string();
        if self.subscriber_exists(&subscriber_id).await? {
            return Ok(());
        }

        let body = SubscriberPayload {
            subscriber_id,
            email: &user.email,
            first_name: &user.name,
            phone: user.full_phone(),
        };

        let response = self
            .client
            .post(self.url("/v1/subscribers"))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(provider_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!(user_id = %user.id, %status, body = %text, "Novu identify failed");
            return Err(AppError::ServiceUnavailable(format!(
                "Novu identify returned {}",
                status
            )));
        }

        tracing::info!(user_id = %user.id, "Novu subscriber created");
        Ok(())
    }

    async fn send_otp(&self, user: &User, code: &OtpCode) -> AppResult<()> {
        // Trigger still works for unknown subscribers when `to` carries the email.
        if let Err(e) = self.identify(user).await {
            tracing::warn!(user_id = %user.id, error = %e, "Novu identify before trigger failed");
        }

        let body = TriggerPayload {
            name: &self.config.otp_template,
            to: TriggerRecipient {
                subscriber_id: user.id.to_string(),
                email: &user.email,
            },
            payload: OtpPayload {
                user_name: &user.username,
                otp: code.as_str(),
            },
        };

        let response = self
            .client
            .post(self.url("/v1/events/trigger"))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(provider_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!(user_id = %user.id, %status, body = %text, "Novu trigger failed");
            return Err(AppError::ServiceUnavailable(format!(
                "Novu trigger returned {}",
                status
            )));
        }

        tracing::info!(user_id = %user.id, template = %self.config.otp_template, "OTP notification sent");
        Ok(())
    }
}

fn provider_error(e: reqwest::Error) -> AppError {
    AppError::ServiceUnavailable(format!("Novu request failed: {}", e))
}
