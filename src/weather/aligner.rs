//! Time-window alignment.
//!
//! Maps a wall-clock instant onto series indices: the interval that
//! contains "now", and the nearest interval for each forward-looking
//! time bucket. Values from the four series are then read at the same
//! index, clamped to each series' length.

use chrono::{DateTime, Duration, FixedOffset, Timelike};

use super::resolver::ResolvedForecast;
use crate::types::{Element, ForecastSeries, PointValue};

/// Index of the point whose `[start, end)` contains `now`, or 0.
pub fn current_index(series: &ForecastSeries, now: DateTime<FixedOffset>) -> usize {
    series
        .points
        .iter()
        .position(|p| p.contains(now))
        .unwrap_or(0)
}

/// A fixed-width forward-looking interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucket {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// The bucket starts on a later calendar day than "now".
    pub next_day: bool,
}

/// First bucket boundary for `now`.
///
/// The next whole hour, pushed one hour further once `now` is at or past
/// the half hour: 14:10 → 15:00, 14:45 → 16:00. An instant exactly on
/// the hour is its own boundary.
pub fn first_boundary(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let hour_start = now
        - Duration::minutes(i64::from(now.minute()))
        - Duration::seconds(i64::from(now.second()))
        - Duration::nanoseconds(i64::from(now.nanosecond()));
    if hour_start == now {
        return now;
    }
    let bump = if now.minute() >= 30 { 2 } else { 1 };
    hour_start + Duration::hours(bump)
}

/// `count` consecutive buckets of `hours` width starting at the first
/// boundary after `now`.
pub fn next_buckets(now: DateTime<FixedOffset>, hours: u32, count: usize) -> Vec<TimeBucket> {
    let width = Duration::hours(i64::from(hours.max(1)));
    let first = first_boundary(now);
    let today = now.date_naive();

    (0..count)
        .map(|i| {
            let start = first + width * i as i32;
            TimeBucket {
                start,
                end: start + width,
                next_day: start.date_naive() > today,
            }
        })
        .collect()
}

/// Hour-of-day distance on a 24-hour clock.
pub fn hour_distance(a: u32, b: u32) -> u32 {
    let d = a.abs_diff(b) % 24;
    d.min(24 - d)
}

/// Index whose start hour is closest to `at`'s hour; earliest on ties.
pub fn nearest_index(series: &ForecastSeries, at: DateTime<FixedOffset>) -> Option<usize> {
    series
        .points
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| hour_distance(p.start.hour(), at.hour()))
        .map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Aligned rows
// ---------------------------------------------------------------------------

/// Values for "right now".
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub condition: Option<PointValue>,
    pub rain: Option<PointValue>,
    pub min_temp: Option<PointValue>,
    pub max_temp: Option<PointValue>,
}

/// Values for one time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyLine {
    pub bucket: TimeBucket,
    pub condition: Option<PointValue>,
    pub rain: Option<PointValue>,
    pub min_temp: Option<PointValue>,
    pub max_temp: Option<PointValue>,
}

/// The series indices are read against: condition, or the first
/// element that resolved at all.
fn reference_series(forecast: &ResolvedForecast) -> &ForecastSeries {
    Element::ALL
        .iter()
        .map(|e| forecast.series(*e))
        .find(|s| !s.is_empty())
        .unwrap_or(&forecast.condition)
}

fn values_at(forecast: &ResolvedForecast, index: usize) -> [Option<PointValue>; 4] {
    [
        forecast.condition.value_at(index).cloned(),
        forecast.rain.value_at(index).cloned(),
        forecast.min_temp.value_at(index).cloned(),
        forecast.max_temp.value_at(index).cloned(),
    ]
}

pub fn current_conditions(
    forecast: &ResolvedForecast,
    now: DateTime<FixedOffset>,
) -> CurrentConditions {
    let index = current_index(reference_series(forecast), now);
    let [condition, rain, min_temp, max_temp] = values_at(forecast, index);
    CurrentConditions {
        condition,
        rain,
        min_temp,
        max_temp,
    }
}

pub fn hourly_lines(
    forecast: &ResolvedForecast,
    now: DateTime<FixedOffset>,
    hours: u32,
    count: usize,
) -> Vec<HourlyLine> {
    let reference = reference_series(forecast);
    next_buckets(now, hours, count)
        .into_iter()
        .map(|bucket| {
            let index = nearest_index(reference, bucket.start).unwrap_or(0);
            let [condition, rain, min_temp, max_temp] = values_at(forecast, index);
            HourlyLine {
                bucket,
                condition,
                rain,
                min_temp,
                max_temp,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
