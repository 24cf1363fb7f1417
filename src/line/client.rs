//! LINE reply client.
//!
//! API: `POST https://api.line.me/v2/bot/message/reply`
//! Auth: `Authorization: Bearer {channel access token}`.
//! A reply token is single-use and expires shortly after delivery.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

use super::ReplySender;
use crate::config::LineConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

pub struct LineClient {
    http: Client,
    reply_url: String,
    access_token: SecretString,
}

impl LineClient {
    pub fn new(cfg: &LineConfig, access_token: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent("weatherbot/0.1.0")
            .build()
            .context("Failed to build HTTP client for LINE")?;

        Ok(Self {
            http,
            reply_url: cfg.reply_url.clone(),
            access_token,
        })
    }
}

#[async_trait]
impl ReplySender for LineClient {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![TextMessage {
                kind: "text",
                text,
            }],
        };

        let resp = self
            .http
            .post(&self.reply_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .context("LINE reply request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "LINE reply rejected");
            anyhow::bail!("LINE API error {status}: {detail}");
        }

        debug!(chars = text.chars().count(), "Reply sent");
        Ok(())
    }
}
