//! Request orchestration: trigger matching → concurrent fetches →
//! extraction → report text.
//!
//! Every step degrades instead of failing: a fetch error blanks its
//! section, a missing field renders as a placeholder.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, ReportConfig};
use crate::types::{to_region_local, Dataset, FetchError, RegionQuery};
use crate::weather::aligner::{current_conditions, hourly_lines};
use crate::weather::daily::daily_summaries;
use crate::weather::report::{NearTermSection, Report, ReportRenderer};
use crate::weather::resolver::ResolvedForecast;
use crate::weather::ForecastSource;

/// Stateless per-request forecast responder.
pub struct WeatherBot {
    source: Arc<dyn ForecastSource>,
    region: RegionQuery,
    offset: FixedOffset,
    triggers: Vec<String>,
    fetch_timeout: Duration,
    report: ReportConfig,
    renderer: ReportRenderer,
}

impl WeatherBot {
    pub fn new(source: Arc<dyn ForecastSource>, cfg: &AppConfig) -> Result<Self> {
        let region = RegionQuery::new(cfg.bot.default_region.clone());
        Ok(Self {
            source,
            offset: cfg.cwa.region_offset()?,
            triggers: cfg
                .bot
                .trigger_keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            fetch_timeout: Duration::from_secs(cfg.cwa.timeout_secs.max(1)),
            report: cfg.report.clone(),
            renderer: ReportRenderer::new(region.as_str(), &cfg.report),
            region,
        })
    }

    pub fn region(&self) -> &RegionQuery {
        &self.region
    }

    /// Whether `text` contains any trigger keyword.
    pub fn matches_trigger(&self, text: &str) -> bool {
        self.triggers.iter().any(|k| text.contains(k.as_str()))
    }

    /// Reply for a user message, or `None` when it is not a forecast request.
    pub async fn reply_for_text(&self, text: &str) -> Option<String> {
        if !self.matches_trigger(text) {
            debug!(text, "No trigger keyword, ignoring message");
            return None;
        }
        Some(self.build_report_now().await)
    }

    pub async fn build_report_now(&self) -> String {
        self.build_report(to_region_local(Utc::now(), self.offset))
            .await
    }

    /// Fetch both datasets concurrently and render the reply for `now`.
    pub async fn build_report(&self, now: DateTime<FixedOffset>) -> String {
        let (near, five_day) = tokio::join!(
            self.fetch(Dataset::NearTerm),
            self.fetch(Dataset::FiveDay),
        );

        let near_term = near.map(|payload| {
            let forecast = ResolvedForecast::resolve(&payload, &self.region, self.offset);
            NearTermSection {
                current: current_conditions(&forecast, now),
                hourly: hourly_lines(
                    &forecast,
                    now,
                    self.report.bucket_hours,
                    self.report.bucket_count,
                ),
            }
        });

        let daily = five_day.map(|payload| {
            let forecast = ResolvedForecast::resolve(&payload, &self.region, self.offset);
            daily_summaries(&forecast, now.date_naive(), self.report.days)
        });

        info!(
            region = %self.region,
            near_term = near_term.is_some(),
            five_day = daily.is_some(),
            "Forecast report built"
        );

        self.renderer.render(&Report { near_term, daily })
    }

    /// One bounded fetch; failures are logged and become `None`.
    async fn fetch(&self, dataset: Dataset) -> Option<Value> {
        let result = tokio::time::timeout(self.fetch_timeout, self.source.fetch(dataset, &self.region))
            .await
            .unwrap_or(Err(FetchError::Timeout));

        match result {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(%dataset, region = %self.region, error = %e, "Forecast fetch failed");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
