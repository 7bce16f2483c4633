//! screener-trend - Stage-2 uptrend screen.
//!
//! Reads the liquidity stage's symbols, fetches moving averages and the
//! 52-week high for each one through a pool of headless browser sessions,
//! keeps the symbols in a stage-2 uptrend and writes them to the trend
//! stage artifact.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod aggregator;
pub mod artifact;
pub mod fetcher;
pub mod metrics;
pub mod orchestrator;
pub mod record;
pub mod report;
pub mod screener;
pub mod source;
pub mod stage;

pub use aggregator::{AggregateReport, Aggregator, AggregatorHandle, UnitReport};
pub use artifact::ArtifactStore;
pub use fetcher::{extract_trend_metrics, TrendLauncher, TrendSession};
pub use metrics::{percent_change, relative_strength, MetricsError};
pub use orchestrator::{screen_symbol, PipelineError, RunSummary, TrendPipeline, WorkerContext};
pub use record::{SymbolRecord, TrendMetrics, TrendRecord};
pub use screener::{is_stage_two_uptrend, screen, FailureReason, ScreenOutcome, Screening};
pub use source::{DataSource, FetchFailure};
pub use stage::{run_stage_with, run_trend_stage};
