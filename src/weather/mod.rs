//! Forecast retrieval and reporting.
//!
//! Defines the `ForecastSource` trait and the pipeline that turns an
//! untyped CWA payload into report text:
//! resolver (payload → series) → aligner / daily (series → rows) →
//! report (rows → text).

pub mod aligner;
pub mod cwa;
pub mod daily;
pub mod report;
pub mod resolver;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Dataset, FetchError, RegionQuery};

/// Abstraction over the forecast provider.
///
/// The returned JSON has no contractual shape; callers probe it through
/// `resolver`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Perform one network read for `dataset` in `region`.
    async fn fetch(&self, dataset: Dataset, region: &RegionQuery) -> Result<Value, FetchError>;
}
