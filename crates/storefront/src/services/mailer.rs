//! Access code delivery.
//!
//! New and returning mailing list subscribers get their community access
//! code by email. Delivery goes through the `EmailJS` REST API when it is
//! configured, and is only logged otherwise.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use sparktizen_core::Email;

use crate::config::EmailJsConfig;

/// `EmailJS` send endpoint.
const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Errors that can occur when sending an access code.
#[derive(Debug, Error)]
pub enum MailerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Sends community access codes.
#[async_trait]
pub trait AccessCodeMailer: Send + Sync {
    /// Send `code` to `to`.
    async fn send_access_code(&self, to: &Email, code: &str) -> Result<(), MailerError>;
}

// =============================================================================
// EmailJsClient
// =============================================================================

/// `EmailJS` REST client.
#[derive(Clone)]
pub struct EmailJsClient {
    client: reqwest::Client,
    endpoint: String,
    service_id: String,
    template_id: String,
    public_key: SecretString,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    to_email: &'a str,
    user_code: &'a str,
}

impl EmailJsClient {
    /// Create a new `EmailJS` client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &EmailJsConfig) -> Result<Self, MailerError> {
        Self::with_endpoint(config, EMAILJS_SEND_URL)
    }

    /// Create a client that posts to a different endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_endpoint(
        config: &EmailJsConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self, MailerError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            public_key: config.public_key.clone(),
        })
    }
}

#[async_trait]
impl AccessCodeMailer for EmailJsClient {
    #[instrument(skip(self, code), fields(to = %to))]
    async fn send_access_code(&self, to: &Email, code: &str) -> Result<(), MailerError> {
        let body = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: self.public_key.expose_secret(),
            template_params: TemplateParams {
                to_email: to.as_str(),
                user_code: code,
            },
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

// =============================================================================
// LogMailer
// =============================================================================

/// Mailer used when no email service is configured. Logs and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl AccessCodeMailer for LogMailer {
    async fn send_access_code(&self, to: &Email, _code: &str) -> Result<(), MailerError> {
        tracing::warn!(to = %to, "Email delivery not configured; access code not sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = SendRequest {
            service_id: "service_1",
            template_id: "template_1",
            user_id: "public_1",
            template_params: TemplateParams {
                to_email: "a@b.test",
                user_code: "ABCD1234",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["service_id"], "service_1");
        assert_eq!(json["user_id"], "public_1");
        assert_eq!(json["template_params"]["to_email"], "a@b.test");
        assert_eq!(json["template_params"]["user_code"], "ABCD1234");
    }

    #[tokio::test]
    async fn test_log_mailer_succeeds() {
        let to = Email::parse("a@b.test").unwrap();
        assert!(LogMailer.send_access_code(&to, "ABCD1234").await.is_ok());
    }
}
