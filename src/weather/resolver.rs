//! Field-path resolution over untyped CWA payloads.
//!
//! The same logical field has been published as `weatherElement` /
//! `WeatherElement`, `time` / `Time`, `elementValue` / `ElementValue`,
//! with the value sometimes one level deeper than before. Every lookup
//! goes through an ordered list of candidate paths; the first path that
//! yields data wins. Nothing here fails: missing structure resolves to an
//! empty series or a missing value.

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::Value;
use tracing::debug;

use crate::types::{parse_timestamp, Element, ForecastPoint, ForecastSeries, PointValue, RegionQuery};

// ---------------------------------------------------------------------------
// Candidate paths
// ---------------------------------------------------------------------------

/// A lookup path. `*` fans out over an array (non-arrays pass through).
type Path = &'static [&'static str];

/// Placeholder segment replaced by the element's value key.
const VALUE_KEY: &str = "$value";

const LOCATION_PATHS: &[Path] = &[
    &["records", "locations", "*", "location"],
    &["records", "location"],
];

const LOCATION_NAME_PATHS: &[Path] = &[&["locationName"]];

const ELEMENT_PATHS: &[Path] = &[&["weatherElement"]];

const ELEMENT_NAME_PATHS: &[Path] = &[&["elementName"], &["description"]];

const TIME_PATHS: &[Path] = &[&["time"]];

const START_PATHS: &[Path] = &[&["startTime"], &["dataTime"]];

const END_PATHS: &[Path] = &[&["endTime"]];

const VALUE_PATHS: &[Path] = &[
    &["parameter", "parameterName"],
    &["elementValue", "*", VALUE_KEY],
    &["elementValue", "*", "value"],
    &["elementValue", "*", "measure"],
    &["elementValue"],
    &["value"],
];

// ---------------------------------------------------------------------------
// Lookup primitives
// ---------------------------------------------------------------------------

/// Object key lookup: exact match first, then ASCII case-insensitive.
fn get_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let obj = value.as_object()?;
    obj.get(key).or_else(|| {
        obj.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Walk `path` from `root`, returning every value reached.
///
/// A key segment that meets an array is applied to each element, so a
/// field nested one level deeper than the path expects still resolves.
fn walk<'a>(root: &'a Value, path: &[&str], value_key: &str) -> Vec<&'a Value> {
    let mut current = vec![root];
    for segment in path {
        let mut next = Vec::new();
        for value in current {
            match (*segment, value) {
                ("*", Value::Array(items)) => next.extend(items.iter()),
                ("*", other) => next.push(other),
                (key, Value::Array(items)) => {
                    let key = if key == VALUE_KEY { value_key } else { key };
                    next.extend(items.iter().filter_map(|item| get_key(item, key)));
                }
                (key, other) => {
                    let key = if key == VALUE_KEY { value_key } else { key };
                    next.extend(get_key(other, key));
                }
            }
        }
        current = next;
    }
    current
}

/// Nodes from the first candidate path that yields any, with trailing
/// arrays flattened.
fn first_nodes<'a>(root: &'a Value, paths: &[Path]) -> Vec<&'a Value> {
    for path in paths {
        let nodes: Vec<&Value> = walk(root, path, "")
            .into_iter()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter(|v| !v.is_null())
            .collect();
        if !nodes.is_empty() {
            return nodes;
        }
    }
    Vec::new()
}

/// Scalar view of a node. Blank and dash placeholders count as missing.
fn scalar(value: &Value) -> Option<PointValue> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "-" || s == "--" {
                None
            } else {
                Some(PointValue::Text(s.to_string()))
            }
        }
        Value::Number(n) => n.as_f64().map(PointValue::Number),
        _ => None,
    }
}

/// First scalar reachable through any candidate path, in path order.
fn first_scalar(root: &Value, paths: &[Path], value_key: &str) -> Option<PointValue> {
    paths
        .iter()
        .find_map(|path| walk(root, path, value_key).into_iter().find_map(scalar))
}

fn first_text(root: &Value, paths: &[Path]) -> Option<String> {
    first_scalar(root, paths, "").map(|v| v.to_string())
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Pick the location named `region`, or the first one when none matches.
fn select_location<'a>(payload: &'a Value, region: &RegionQuery) -> Option<&'a Value> {
    let locations = first_nodes(payload, LOCATION_PATHS);
    let wanted = region.as_str().trim();
    locations
        .iter()
        .copied()
        .find(|loc| first_text(loc, LOCATION_NAME_PATHS).as_deref() == Some(wanted))
        .or_else(|| locations.first().copied())
}

fn select_element<'a>(location: &'a Value, element: Element) -> Option<&'a Value> {
    first_nodes(location, ELEMENT_PATHS).into_iter().find(|node| {
        first_text(node, ELEMENT_NAME_PATHS)
            .map(|name| element.matches(&name))
            .unwrap_or(false)
    })
}

/// Build points from time entries, filling absent end times from the
/// following start (or a one-hour width for the last point).
fn build_points(entries: &[&Value], element: Element, offset: FixedOffset) -> Vec<ForecastPoint> {
    struct Raw {
        start: DateTime<FixedOffset>,
        end: Option<DateTime<FixedOffset>>,
        value: Option<PointValue>,
    }

    let raw: Vec<Raw> = entries
        .iter()
        .filter_map(|entry| {
            let start = first_text(entry, START_PATHS).and_then(|s| parse_timestamp(&s, offset))?;
            let end = first_text(entry, END_PATHS)
                .and_then(|s| parse_timestamp(&s, offset))
                .filter(|end| *end > start);
            Some(Raw {
                start,
                end,
                value: first_scalar(entry, VALUE_PATHS, element.value_key()),
            })
        })
        .collect();

    let mut points = Vec::with_capacity(raw.len());
    for (i, r) in raw.iter().enumerate() {
        let end = r
            .end
            .or_else(|| raw.get(i + 1).map(|n| n.start).filter(|s| *s > r.start))
            .unwrap_or(r.start + Duration::hours(1));
        points.push(ForecastPoint {
            start: r.start,
            end,
            value: r.value.clone(),
        });
    }
    points
}

/// Resolve one element's series for `region`. Empty when absent.
pub fn resolve_series(
    payload: &Value,
    region: &RegionQuery,
    element: Element,
    offset: FixedOffset,
) -> ForecastSeries {
    let Some(location) = select_location(payload, region) else {
        debug!(%region, %element, "No location in forecast payload");
        return ForecastSeries::empty(element);
    };
    let Some(node) = select_element(location, element) else {
        debug!(%region, %element, "Element not found in forecast payload");
        return ForecastSeries::empty(element);
    };

    let entries = first_nodes(node, TIME_PATHS);
    let points = build_points(&entries, element, offset);
    if points.is_empty() {
        debug!(%region, %element, "Element has no usable time entries");
    }
    ForecastSeries::new(element, points)
}

/// All four elements resolved from one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedForecast {
    pub condition: ForecastSeries,
    pub rain: ForecastSeries,
    pub min_temp: ForecastSeries,
    pub max_temp: ForecastSeries,
}

impl ResolvedForecast {
    pub fn resolve(payload: &Value, region: &RegionQuery, offset: FixedOffset) -> Self {
        Self {
            condition: resolve_series(payload, region, Element::Condition, offset),
            rain: resolve_series(payload, region, Element::RainProbability, offset),
            min_temp: resolve_series(payload, region, Element::MinTemperature, offset),
            max_temp: resolve_series(payload, region, Element::MaxTemperature, offset),
        }
    }

    pub fn series(&self, element: Element) -> &ForecastSeries {
        match element {
            Element::Condition => &self.condition,
            Element::RainProbability => &self.rain,
            Element::MinTemperature => &self.min_temp,
            Element::MaxTemperature => &self.max_temp,
        }
    }

    /// True when no element resolved at all.
    pub fn is_empty(&self) -> bool {
        Element::ALL.iter().all(|e| self.series(*e).is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
