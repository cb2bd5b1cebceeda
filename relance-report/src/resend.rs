//! Resend-compatible transactional email client.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

/// Outbound email delivery seam, so dispatch logic can be tested without a
/// network.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one HTML email; returns the provider's email id.
    async fn send_email(&self, from: &str, to: &str, subject: &str, html: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl EmailClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests, self-hosted relay).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl EmailSender for EmailClient {
    async fn send_email(&self, from: &str, to: &str, subject: &str, html: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            from: &'a str,
            to: &'a str,
            subject: &'a str,
            html: &'a str,
        }

        #[derive(Deserialize)]
        struct Resp {
            id: String,
        }

        let resp = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&Req { from, to, subject, html })
            .send()
            .await
            .context("sending email request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("email API error {status}: {text}");
        }

        let parsed: Resp = resp.json().await.context("parsing email API response")?;
        Ok(parsed.id)
    }
}
