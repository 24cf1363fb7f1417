//! CWA open-data forecast client.
//!
//! API: `https://opendata.cwa.gov.tw/api/v1/rest/datastore/{dataset}`
//! Auth: `Authorization` query parameter carrying the member API key.
//! Datasets: `F-C0032-001` (36-hour, county level) and the `F-D0047-*`
//! family (multi-day, township level).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::ForecastSource;
use crate::config::{CwaConfig, DatasetConfig};
use crate::types::{Dataset, FetchError, RegionQuery};

/// CWA forecast client. One GET per call, no retries.
pub struct CwaClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    near_term: DatasetConfig,
    five_day: DatasetConfig,
}

impl CwaClient {
    pub fn new(cfg: &CwaConfig, api_key: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent("weatherbot/0.1.0")
            .build()
            .context("Failed to build HTTP client for CWA")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            near_term: cfg.near_term.clone(),
            five_day: cfg.five_day.clone(),
        })
    }

    fn dataset(&self, dataset: Dataset) -> &DatasetConfig {
        match dataset {
            Dataset::NearTerm => &self.near_term,
            Dataset::FiveDay => &self.five_day,
        }
    }

    /// Request URL without the credential, for logging.
    fn public_url(&self, dataset: Dataset, region: &RegionQuery) -> String {
        let ds = self.dataset(dataset);
        let mut url = format!(
            "{}/{}?locationName={}",
            self.base_url,
            ds.id,
            urlencoding::encode(region.as_str()),
        );
        if !ds.elements.is_empty() {
            let names: Vec<_> = ds
                .elements
                .iter()
                .map(|e| urlencoding::encode(e).into_owned())
                .collect();
            url.push_str("&elementName=");
            url.push_str(&names.join(","));
        }
        url
    }

    fn request_url(&self, dataset: Dataset, region: &RegionQuery) -> String {
        format!(
            "{}&Authorization={}",
            self.public_url(dataset, region),
            urlencoding::encode(self.api_key.expose_secret()),
        )
    }
}

/// CWA answers some failures (bad key, unknown dataset) with 200 and
/// `"success": "false"`.
fn reported_failure(body: &Value) -> Option<String> {
    let flag = body.get("success")?;
    let failed = match flag {
        Value::String(s) => s.eq_ignore_ascii_case("false"),
        Value::Bool(b) => !b,
        _ => false,
    };
    if !failed {
        return None;
    }
    let message = body
        .get("message")
        .or_else(|| body.get("result"))
        .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
        .unwrap_or_else(|| "success=false".to_string());
    Some(message)
}

#[async_trait]
impl ForecastSource for CwaClient {
    async fn fetch(&self, dataset: Dataset, region: &RegionQuery) -> Result<Value, FetchError> {
        debug!(url = %self.public_url(dataset, region), %dataset, "Fetching CWA forecast");

        let resp = self
            .http
            .get(self.request_url(dataset, region))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %dataset, %region, "CWA API error");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let body: Value =
            serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))?;

        if let Some(message) = reported_failure(&body) {
            warn!(%dataset, %region, message = %message, "CWA reported failure");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: message,
            });
        }

        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
