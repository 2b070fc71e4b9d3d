//! Transactional email through the Resend HTTP API.
//!
//! Without an API key the mailer logs the message instead of sending it, unless mocks mode is
//! on: then it sends to `base_url` unauthenticated so the mock server can record it.

use crate::constants::DEFAULT_RESEND_API_BASE;
use crate::{HmsError, HmsResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// What happened to an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the provider under this id.
    Sent { id: String },
    /// Not sent; written to the log.
    Logged,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    mocks: bool,
}

impl ResendMailer {
    /// `base_url` defaults to the public Resend API when `None` or blank.
    pub fn new(base_url: Option<String>, api_key: Option<String>, mocks: bool) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_RESEND_API_BASE.to_string());
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            mocks,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, email: &Email) -> HmsResult<Delivery> {
        if self.api_key.is_none() && !self.mocks {
            tracing::warn!(
                to = %email.to,
                subject = %email.subject,
                "RESEND_API_KEY not set and not in mocks mode; email not sent"
            );
            tracing::info!(html = %email.html, text = ?email.text, "unsent email body");
            return Ok(Delivery::Logged);
        }

        let mut request = self
            .client
            .post(format!("{}/emails", self.base_url))
            .json(email);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HmsError::MailRejected {
                status: status.as_u16(),
                body,
            });
        }

        let SendResponse { id } = response.json().await?;
        tracing::info!(%id, to = %email.to, "email sent");
        Ok(Delivery::Sent { id })
    }
}
