//! Stage-2 uptrend classification.
//!
//! Classification is pure. The human-readable lines describing each
//! decision are built here but appended to the report by the caller.

use std::fmt;

use crate::metrics::{percent_change, MetricsError};
use crate::record::{SymbolRecord, TrendMetrics, TrendRecord};
use crate::source::FetchFailure;

/// Symbols further than this below their 52-week high are filtered.
pub const MAX_PERCENT_BELOW_HIGH: f64 = 50.0;

/// Why a symbol ended up Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    Timeout,
    IncompleteData,
    Navigation,
    /// Upstream data made a metric undefined (zero high, NaN price).
    CorruptInput,
    /// The unit of work panicked.
    Panicked,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Timeout => "request timed out",
            Self::IncompleteData => "insufficient data",
            Self::Navigation => "page load failed",
            Self::CorruptInput => "corrupt input",
            Self::Panicked => "internal error",
        };
        f.write_str(reason)
    }
}

impl From<&FetchFailure> for FailureReason {
    fn from(failure: &FetchFailure) -> Self {
        match failure {
            FetchFailure::Timeout => Self::Timeout,
            FetchFailure::IncompleteData { .. } => Self::IncompleteData,
            FetchFailure::Navigation(_) => Self::Navigation,
        }
    }
}

/// Final classification of one input record.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOutcome {
    Passed(TrendRecord),
    Filtered,
    Failed(FailureReason),
}

impl ScreenOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed(_))
    }
}

/// Result of screening a record with fetched metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Screening {
    pub percent_below_high: f64,
    pub outcome: ScreenOutcome,
}

/// Whether a symbol is in a stage-2 uptrend.
///
/// Rejects when price sits under either long average, when the short
/// averages are not stacked above the 50-day, or when the price is more
/// than [`MAX_PERCENT_BELOW_HIGH`] below the 52-week high.
pub fn is_stage_two_uptrend(price: f64, metrics: &TrendMetrics, percent_below_high: f64) -> bool {
    let rejected = price < metrics.sma_50
        || price < metrics.sma_200
        || metrics.ema_10 < metrics.ema_21
        || metrics.ema_21 < metrics.sma_50
        || percent_below_high > MAX_PERCENT_BELOW_HIGH;
    !rejected
}

/// Classify a record against its metrics.
///
/// Errors from the metric primitives are returned unchanged.
pub fn screen(record: SymbolRecord, metrics: &TrendMetrics) -> Result<Screening, MetricsError> {
    let percent_below_high = -percent_change(metrics.high_52_week, record.price)?;

    let outcome = if is_stage_two_uptrend(record.price, metrics, percent_below_high) {
        ScreenOutcome::Passed(TrendRecord::new(record, metrics, percent_below_high))
    } else {
        ScreenOutcome::Filtered
    };

    Ok(Screening {
        percent_below_high,
        outcome,
    })
}

/// The metrics line logged for every screened symbol.
pub fn summary_line(symbol: &str, price: f64, metrics: &TrendMetrics, percent_below_high: f64) -> String {
    format!(
        "{symbol} | 10-day EMA: ${}, 21-day EMA: ${}, 50-day SMA: ${}, 200-day SMA: ${}\n        \
         Current Price: ${price:.1}, 52-week high: ${}, Percent Below 52-week High: {percent_below_high:.0}%",
        metrics.ema_10, metrics.ema_21, metrics.sma_50, metrics.sma_200, metrics.high_52_week,
    )
}

pub fn skip_message(symbol: &str, reason: FailureReason) -> String {
    format!("Skipping {symbol} ({reason}) . . .")
}

pub fn filter_message(symbol: &str) -> String {
    format!("{symbol} filtered out.")
}
