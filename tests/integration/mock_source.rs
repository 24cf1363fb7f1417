//! In-memory forecast source and reply recorder for integration testing.
//!
//! Payloads are built relative to the current time so the report always
//! has a window containing "now" and five upcoming days.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, Utc};
use serde_json::{json, Value};
use std::sync::Mutex;

use weatherbot::line::ReplySender;
use weatherbot::types::{Dataset, FetchError, RegionQuery};
use weatherbot::weather::ForecastSource;

pub fn taipei() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

pub fn now_local() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&taipei())
}

/// Serves canned payloads; `None` for a dataset simulates an outage.
pub struct StaticSource {
    near_term: Option<Value>,
    five_day: Option<Value>,
    calls: Mutex<Vec<(Dataset, String)>>,
}

impl StaticSource {
    pub fn new(near_term: Option<Value>, five_day: Option<Value>) -> Self {
        Self {
            near_term,
            five_day,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Dataset, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForecastSource for StaticSource {
    async fn fetch(&self, dataset: Dataset, region: &RegionQuery) -> Result<Value, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((dataset, region.as_str().to_string()));
        let payload = match dataset {
            Dataset::NearTerm => &self.near_term,
            Dataset::FiveDay => &self.five_day,
        };
        payload
            .clone()
            .ok_or_else(|| FetchError::Network("connection refused".into()))
    }
}

/// Records every reply; optionally rejects them like an expired token.
#[derive(Default)]
pub struct RecordingReplier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingReplier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySender for RecordingReplier {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((reply_token.to_string(), text.to_string()));
        if self.fail {
            return Err(anyhow!("LINE API error 400: Invalid reply token"));
        }
        Ok(())
    }
}

fn stamp(t: DateTime<FixedOffset>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Legacy-schema county forecast: three 12-hour windows, the first one
/// containing `now`, all reading 多雲 / 30% / 18-22°C.
pub fn near_term_payload(now: DateTime<FixedOffset>) -> Value {
    let first = now - Duration::hours(1);
    let windows: Vec<(String, String)> = (0..3)
        .map(|i| {
            let start = first + Duration::hours(12 * i);
            (stamp(start), stamp(start + Duration::hours(12)))
        })
        .collect();

    let element = |name: &str, value: &str| {
        let time: Vec<Value> = windows
            .iter()
            .map(|(start, end)| {
                json!({
                    "startTime": start,
                    "endTime": end,
                    "parameter": {"parameterName": value}
                })
            })
            .collect();
        json!({"elementName": name, "time": time})
    };

    json!({
        "success": "true",
        "records": {
            "datasetDescription": "三十六小時天氣預報",
            "location": [
                {
                    "locationName": "臺北市",
                    "weatherElement": [element("Wx", "晴天"), element("PoP", "0")]
                },
                {
                    "locationName": "宜蘭縣",
                    "weatherElement": [
                        element("Wx", "多雲"),
                        element("PoP", "30"),
                        element("MinT", "18"),
                        element("MaxT", "22"),
                    ]
                }
            ]
        }
    })
}

/// Expected numbers for day `d` of the five-day payload.
pub fn day_values(d: u64) -> (u64, u64, u64) {
    (20 + d, 28 + d, 10 * d)
}

/// Newer-schema township forecast: two 12-hour points per day for five
/// days starting at `today`.
pub fn five_day_payload(today: NaiveDate) -> Value {
    let offset = taipei();
    let slots: Vec<(u64, DateTime<FixedOffset>)> = (0..5u64)
        .flat_map(|d| {
            let date = today.checked_add_days(Days::new(d)).unwrap();
            [6, 18].map(move |h| {
                let naive = date.and_hms_opt(h, 0, 0).unwrap();
                (d, naive.and_local_timezone(offset).unwrap())
            })
        })
        .collect();

    let element = |name: &str, key: &str, value: &dyn Fn(u64) -> String| {
        let time: Vec<Value> = slots
            .iter()
            .map(|(d, start)| {
                let mut reading = serde_json::Map::new();
                reading.insert(key.to_string(), Value::String(value(*d)));
                json!({
                    "StartTime": start.to_rfc3339(),
                    "EndTime": (*start + Duration::hours(12)).to_rfc3339(),
                    "ElementValue": [reading]
                })
            })
            .collect();
        json!({"ElementName": name, "Time": time})
    };

    json!({
        "success": "true",
        "records": {
            "Locations": [{
                "DatasetDescription": "臺灣各縣市鄉鎮未來1週逐12小時天氣預報",
                "LocationsName": "宜蘭縣",
                "Location": [{
                    "LocationName": "宜蘭市",
                    "WeatherElement": [
                        element("天氣現象", "Weather", &|_| "晴".to_string()),
                        element("最低溫度", "MinTemperature", &|d| day_values(d).0.to_string()),
                        element("最高溫度", "MaxTemperature", &|d| day_values(d).1.to_string()),
                        element("12小時降雨機率", "ProbabilityOfPrecipitation", &|d| {
                            day_values(d).2.to_string()
                        }),
                    ]
                }]
            }]
        }
    })
}
