//! Data source abstraction for per-symbol trend metrics.
//!
//! The pipeline only needs one operation from a source: fetch the five
//! trend figures for a symbol. The browser-backed implementation lives in
//! [`crate::fetcher`]; tests substitute deterministic sources.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::TrendMetrics;

/// Why a fetch produced no metrics.
///
/// Every variant is local to one symbol; none of them stops the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// The data region did not appear within the fetch budget.
    #[error("data region did not load in time")]
    Timeout,

    /// One or more of the five fields could not be parsed.
    #[error("missing fields: {}", missing.join(", "))]
    IncompleteData { missing: Vec<&'static str> },

    /// Page load failed for a reason other than the timeout.
    #[error("navigation failed: {0}")]
    Navigation(String),
}

/// A source of trend metrics keyed by symbol.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<TrendMetrics, FetchFailure>;
}
