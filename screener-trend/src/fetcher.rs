//! Browser-backed trend metrics fetcher.
//!
//! Each symbol's pivot-point page carries a moving-average table with one
//! cell per average (`td.ma10`, `td.ma21`, `td.ma50`, `td.ma200`) and a
//! row marked `data-marker="52wkHigh"` whose `data-value` attribute holds
//! the 52-week high.

use async_trait::async_trait;
use scraper::Html;
use screener_browser::{
    extract_numeric_attribute, extract_numeric_cell, select_first, BrowserError, BrowserSession,
    ChromeLauncher, ManagedSession, SessionLauncher, WorkerId,
};
use screener_common::config::{BrowserConfig, FetchConfig};
use std::sync::Arc;
use std::time::Duration;

use crate::record::TrendMetrics;
use crate::source::{DataSource, FetchFailure};

const EMA_10_CELL: &str = "td.ma10";
const EMA_21_CELL: &str = "td.ma21";
const SMA_50_CELL: &str = "td.ma50";
const SMA_200_CELL: &str = "td.ma200";
const HIGH_ROW: &str = r#"tr[data-marker="52wkHigh"]"#;
const HIGH_ATTRIBUTE: &str = "data-value";

fn required(value: Option<f64>, field: &'static str, missing: &mut Vec<&'static str>) -> f64 {
    value.unwrap_or_else(|| {
        missing.push(field);
        f64::NAN
    })
}

/// Extract the five trend figures from a rendered page.
///
/// All five fields are examined; the failure names every one that is
/// missing or unparseable.
pub fn extract_trend_metrics(html: &str) -> Result<TrendMetrics, FetchFailure> {
    let document = Html::parse_document(html);
    let cell = |selector: &str| select_first(&document, selector).and_then(extract_numeric_cell);

    let mut missing = Vec::new();
    let ema_10 = required(cell(EMA_10_CELL), "10-day EMA", &mut missing);
    let ema_21 = required(cell(EMA_21_CELL), "21-day EMA", &mut missing);
    let sma_50 = required(cell(SMA_50_CELL), "50-day SMA", &mut missing);
    let sma_200 = required(cell(SMA_200_CELL), "200-day SMA", &mut missing);
    let high_52_week = required(
        select_first(&document, HIGH_ROW).and_then(|row| extract_numeric_attribute(row, HIGH_ATTRIBUTE)),
        "52-week high",
        &mut missing,
    );

    if !missing.is_empty() {
        return Err(FetchFailure::IncompleteData { missing });
    }

    Ok(TrendMetrics {
        ema_10,
        ema_21,
        sma_50,
        sma_200,
        high_52_week,
    })
}

impl From<BrowserError> for FetchFailure {
    fn from(err: BrowserError) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Navigation(err.to_string())
        }
    }
}

/// A worker's browser session paired with the fetch settings.
#[derive(Debug)]
pub struct TrendSession {
    browser: BrowserSession,
    fetch: Arc<FetchConfig>,
}

#[async_trait]
impl DataSource for TrendSession {
    async fn fetch(&self, symbol: &str) -> Result<TrendMetrics, FetchFailure> {
        let url = self.fetch.url_for(symbol);
        let html = self
            .browser
            .load_when_ready(
                &url,
                &self.fetch.region_selector,
                Duration::from_secs(self.fetch.timeout_secs),
                Duration::from_millis(self.fetch.poll_interval_ms),
            )
            .await?;

        extract_trend_metrics(&html)
    }
}

#[async_trait]
impl ManagedSession for TrendSession {
    fn id(&self) -> &str {
        self.browser.id()
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.browser.close().await
    }
}

/// Launches a Chromium session per worker and wraps it as a [`TrendSession`].
#[derive(Debug, Clone)]
pub struct TrendLauncher {
    chrome: ChromeLauncher,
    fetch: Arc<FetchConfig>,
}

impl TrendLauncher {
    pub fn new(browser: BrowserConfig, fetch: FetchConfig) -> Self {
        Self {
            chrome: ChromeLauncher::new(browser),
            fetch: Arc::new(fetch),
        }
    }
}

#[async_trait]
impl SessionLauncher for TrendLauncher {
    type Session = TrendSession;

    async fn launch(&self, worker: WorkerId) -> Result<TrendSession, BrowserError> {
        let browser = self.chrome.launch(worker).await?;
        Ok(TrendSession {
            browser,
            fetch: Arc::clone(&self.fetch),
        })
    }
}
