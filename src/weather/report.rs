//! Report text rendering.
//!
//! Pure formatting of aligned rows into the fixed zh-TW reply layout.
//! Missing values render as `--`; a section whose fetch failed is
//! replaced by the apology line.

use std::fmt::Write as _;

use super::aligner::{CurrentConditions, HourlyLine};
use super::daily::DailySummary;
use crate::config::ReportConfig;
use crate::types::PointValue;

/// Shown in place of any section whose data could not be fetched.
pub const APOLOGY: &str = "⚠️ 無法取得天氣資料";

/// Placeholder for a missing value.
pub const PLACEHOLDER: &str = "--";

const RULE: &str = "━━━━━━━━━━━━";
const SOURCE: &str = "資料來源：中央氣象署";

/// The near-term half of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct NearTermSection {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyLine>,
}

/// Everything a reply is rendered from. `None` marks a failed fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub near_term: Option<NearTermSection>,
    pub daily: Option<Vec<DailySummary>>,
}

fn value_text(value: Option<&PointValue>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
}

fn number_text(value: Option<f64>) -> String {
    match value {
        Some(n) => PointValue::Number(n).to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Mean of min and max rounded to one decimal, when both are numeric.
pub fn average_temperature(min: Option<&PointValue>, max: Option<&PointValue>) -> Option<f64> {
    let min = min?.as_number()?;
    let max = max?.as_number()?;
    Some(((min + max) / 2.0 * 10.0).round() / 10.0)
}

/// Renders reports for one region with fixed bucket geometry.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    region: String,
    bucket_hours: u32,
    bucket_count: usize,
    days: usize,
}

impl ReportRenderer {
    pub fn new(region: impl Into<String>, cfg: &ReportConfig) -> Self {
        Self {
            region: region.into(),
            bucket_hours: cfg.bucket_hours.max(1),
            bucket_count: cfg.bucket_count,
            days: cfg.days,
        }
    }

    pub fn render_current(&self, current: &CurrentConditions) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "🌡 目前氣溫：{}°C ~ {}°C",
            value_text(current.min_temp.as_ref()),
            value_text(current.max_temp.as_ref()),
        );
        let _ = writeln!(out, "☁️ 天氣：{}", value_text(current.condition.as_ref()));
        let _ = write!(out, "☔ 降雨機率：{}%", value_text(current.rain.as_ref()));
        if let Some(avg) = average_temperature(current.min_temp.as_ref(), current.max_temp.as_ref()) {
            let _ = write!(out, "\n🌡 平均氣溫：{avg:.1}°C");
        }
        out
    }

    pub fn render_hourly_line(&self, line: &HourlyLine) -> String {
        format!(
            "{}{}-{} {} {}°~{}° ☔{}%",
            if line.bucket.next_day { "明天 " } else { "" },
            line.bucket.start.format("%H:%M"),
            line.bucket.end.format("%H:%M"),
            value_text(line.condition.as_ref()),
            value_text(line.min_temp.as_ref()),
            value_text(line.max_temp.as_ref()),
            value_text(line.rain.as_ref()),
        )
    }

    pub fn render_hourly(&self, lines: &[HourlyLine]) -> String {
        let span = self.bucket_hours as usize * self.bucket_count;
        let mut out = format!("🕒 未來 {span} 小時（每 {} 小時）", self.bucket_hours);
        for line in lines {
            out.push('\n');
            out.push_str(&self.render_hourly_line(line));
        }
        out
    }

    pub fn render_daily_line(&self, day: &DailySummary) -> String {
        format!(
            "{} {} {}°/{}° ☔{}%",
            day.date.format("%m/%d"),
            value_text(day.condition.as_ref()),
            number_text(day.max_temp),
            number_text(day.min_temp),
            number_text(day.rain),
        )
    }

    pub fn render_daily(&self, days: &[DailySummary]) -> String {
        let mut out = format!("📅 未來 {} 天", self.days);
        for day in days {
            out.push('\n');
            out.push_str(&self.render_daily_line(day));
        }
        out
    }

    /// Full reply text. Identical input renders byte-identical output.
    pub fn render(&self, report: &Report) -> String {
        if report.near_term.is_none() && report.daily.is_none() {
            return APOLOGY.to_string();
        }

        let mut sections = vec![format!("📍 {}天氣總覽\n{RULE}", self.region)];
        match &report.near_term {
            Some(near) => {
                sections.push(self.render_current(&near.current));
                sections.push(self.render_hourly(&near.hourly));
            }
            None => sections.push(APOLOGY.to_string()),
        }
        match &report.daily {
            Some(days) => sections.push(self.render_daily(days)),
            None => sections.push(format!("📅 未來 {} 天\n{APOLOGY}", self.days)),
        }

        format!("{}\n{RULE}\n{SOURCE}", sections.join("\n\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
