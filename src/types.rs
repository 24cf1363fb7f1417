//! Shared types for the weather bot.
//!
//! The forecast data model (elements, points, series), the region and
//! dataset keys, the fetch error taxonomy, and the region-local time
//! helpers used across the extractor, aligner, and renderer.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// A weather variable exposed by CWA as a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// `Wx`: condition text.
    Condition,
    /// `PoP`: rain probability in percent.
    RainProbability,
    /// `MinT`
    MinTemperature,
    /// `MaxT`
    MaxTemperature,
}

impl Element {
    pub const ALL: &'static [Element] = &[
        Element::Condition,
        Element::RainProbability,
        Element::MinTemperature,
        Element::MaxTemperature,
    ];

    /// The CWA element code used by the 36-hour dataset.
    pub fn code(&self) -> &'static str {
        match self {
            Element::Condition => "Wx",
            Element::RainProbability => "PoP",
            Element::MinTemperature => "MinT",
            Element::MaxTemperature => "MaxT",
        }
    }

    /// Every `elementName` this element has been published under, in
    /// preference order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Element::Condition => &["Wx", "天氣現象"],
            Element::RainProbability => &[
                "PoP",
                "PoP12h",
                "PoP6h",
                "12小時降雨機率",
                "3小時降雨機率",
            ],
            Element::MinTemperature => &["MinT", "最低溫度"],
            Element::MaxTemperature => &["MaxT", "最高溫度"],
        }
    }

    /// Key of the value inside `ElementValue` entries in the newer
    /// dataset schema.
    pub fn value_key(&self) -> &'static str {
        match self {
            Element::Condition => "Weather",
            Element::RainProbability => "ProbabilityOfPrecipitation",
            Element::MinTemperature => "MinTemperature",
            Element::MaxTemperature => "MaxTemperature",
        }
    }

    /// Whether `name` is one of this element's published names.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.aliases()
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Points and series
// ---------------------------------------------------------------------------

/// A scalar forecast value as published: text or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointValue {
    Text(String),
    Number(f64),
}

impl PointValue {
    /// Numeric view of the value; text values are parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PointValue::Number(n) => Some(*n),
            PointValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointValue::Text(s) => f.write_str(s),
            PointValue::Number(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            PointValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// One half-open interval `[start, end)` of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// `None` when the upstream published a blank or dash.
    pub value: Option<PointValue>,
}

impl ForecastPoint {
    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Region-local calendar date the interval starts on.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }
}

/// A named element with its points ordered by start time.
///
/// Contiguity and ordering are assumed from upstream, not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub element: Element,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn new(element: Element, points: Vec<ForecastPoint>) -> Self {
        Self { element, points }
    }

    pub fn empty(element: Element) -> Self {
        Self {
            element,
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Value at `index`, repeating the last point when the series is
    /// shorter than requested.
    pub fn value_at(&self, index: usize) -> Option<&PointValue> {
        let last = self.points.len().checked_sub(1)?;
        self.points[index.min(last)].value.as_ref()
    }

    pub fn points_on(&self, date: NaiveDate) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(move |p| p.date() == date)
    }

    /// First value starting on `date`.
    pub fn first_on(&self, date: NaiveDate) -> Option<&PointValue> {
        self.points_on(date).find_map(|p| p.value.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// An administrative place name passed verbatim to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionQuery(pub String);

impl RegionQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which forecast product to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dataset {
    /// 36-hour forecast in 12-hour periods.
    NearTerm,
    /// Multi-day forecast.
    FiveDay,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::NearTerm => write!(f, "near-term"),
            Dataset::FiveDay => write!(f, "five-day"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Every way a forecast fetch can fail. Callers degrade all of them the
/// same way.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Forecast request failed: {0}")]
    Network(String),

    #[error("Forecast request timed out")]
    Timeout,

    #[error("Forecast API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode forecast response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Region-local time
// ---------------------------------------------------------------------------

/// Convert a UTC instant to region-local calendar time.
pub fn to_region_local(utc: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    utc.with_timezone(&offset)
}

/// Parse a CWA timestamp.
///
/// Accepts RFC 3339 (`2025-01-02T06:00:00+08:00`) and the naive forms
/// `2025-01-02 06:00:00` / `2025-01-02T06:00:00`, which are read as
/// region-local.
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&offset));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
