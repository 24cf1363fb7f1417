//! Per-day aggregation for the multi-day report.
//!
//! Sub-daily points are folded into one row per calendar date: the
//! lowest minimum, the highest maximum, and the highest nonzero rain
//! probability. A day without data still yields a row.

use chrono::{Days, NaiveDate};

use super::resolver::ResolvedForecast;
use crate::types::{ForecastSeries, PointValue};

/// One calendar day of the multi-day report.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub condition: Option<PointValue>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub rain: Option<f64>,
}

fn numbers_on(series: &ForecastSeries, date: NaiveDate) -> impl Iterator<Item = f64> + '_ {
    series
        .points_on(date)
        .filter_map(|p| p.value.as_ref().and_then(PointValue::as_number))
}

/// Highest nonzero probability; 0 when every value is zero.
fn peak_rain(series: &ForecastSeries, date: NaiveDate) -> Option<f64> {
    numbers_on(series, date).reduce(f64::max)
}

pub fn aggregate_day(date: NaiveDate, forecast: &ResolvedForecast) -> DailySummary {
    DailySummary {
        date,
        condition: forecast.condition.first_on(date).cloned(),
        min_temp: numbers_on(&forecast.min_temp, date).reduce(f64::min),
        max_temp: numbers_on(&forecast.max_temp, date).reduce(f64::max),
        rain: peak_rain(&forecast.rain, date),
    }
}

/// `today` and the `days - 1` dates after it.
pub fn upcoming_days(today: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days as u64)
        .filter_map(|i| today.checked_add_days(Days::new(i)))
        .collect()
}

pub fn daily_summaries(
    forecast: &ResolvedForecast,
    today: NaiveDate,
    days: usize,
) -> Vec<DailySummary> {
    upcoming_days(today, days)
        .into_iter()
        .map(|date| aggregate_day(date, forecast))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
