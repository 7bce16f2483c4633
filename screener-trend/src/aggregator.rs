//! Outcome collection.
//!
//! Workers never touch shared result state. Each finished unit of work is
//! sent over a channel to a single collector task, which owns the
//! [`Aggregator`] and reports progress as units complete.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Level;

use crate::record::TrendRecord;
use crate::screener::ScreenOutcome;

/// Everything a worker reports about one symbol.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub symbol: String,
    pub outcome: ScreenOutcome,
    /// Human-readable lines, appended to the log in order.
    pub lines: Vec<String>,
}

/// Append-only sink for per-symbol outcomes.
#[derive(Debug, Default)]
pub struct Aggregator {
    total: usize,
    passed: Vec<TrendRecord>,
    failed: Vec<String>,
    filtered: Vec<String>,
    log: Vec<String>,
}

impl Aggregator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_passed(&mut self, record: TrendRecord) {
        self.passed.push(record);
    }

    pub fn record_failed(&mut self, symbol: impl Into<String>) {
        self.failed.push(symbol.into());
    }

    pub fn record_filtered(&mut self, symbol: impl Into<String>) {
        self.filtered.push(symbol.into());
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// Record a finished unit: its log lines first, then its outcome.
    pub fn apply(&mut self, unit: UnitReport) {
        for line in unit.lines {
            self.log(line);
        }
        match unit.outcome {
            ScreenOutcome::Passed(record) => self.record_passed(record),
            ScreenOutcome::Filtered => self.record_filtered(unit.symbol),
            ScreenOutcome::Failed(_) => self.record_failed(unit.symbol),
        }
    }

    /// Units recorded so far.
    pub fn completed(&self) -> usize {
        self.passed.len() + self.failed.len() + self.filtered.len()
    }

    pub fn snapshot(&self) -> AggregateReport {
        AggregateReport {
            total: self.total,
            passed: self.passed.clone(),
            failed: self.failed.clone(),
            filtered: self.filtered.clone(),
            log: self.log.clone(),
        }
    }

    pub fn into_report(self) -> AggregateReport {
        AggregateReport {
            total: self.total,
            passed: self.passed,
            failed: self.failed,
            filtered: self.filtered,
            log: self.log,
        }
    }
}

/// Final (or intermediate) view of the collected outcomes.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    /// Number of input records.
    pub total: usize,
    /// Passed records in completion order.
    pub passed: Vec<TrendRecord>,
    pub failed: Vec<String>,
    pub filtered: Vec<String>,
    pub log: Vec<String>,
}

impl AggregateReport {
    pub fn passed_count(&self) -> usize {
        self.passed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Derived from the input size, so unfinished units count as filtered.
    pub fn filtered_count(&self) -> usize {
        self.total
            .saturating_sub(self.passed_count())
            .saturating_sub(self.failed_count())
    }

    /// Log lines joined in append order, separated by blank lines.
    pub fn log_text(&self) -> String {
        self.log.join("\n\n")
    }
}

/// Progress after every unit: `DEBUG` normally, raised to `INFO` roughly
/// every 5% of the run.
#[derive(Debug)]
struct Progress {
    total: usize,
    step: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            step: (total / 20).max(1),
        }
    }

    fn should_report(&self, completed: usize) -> bool {
        completed == self.total || completed % self.step == 0
    }

    fn level(&self, completed: usize) -> Level {
        if self.should_report(completed) {
            Level::INFO
        } else {
            Level::DEBUG
        }
    }

    fn percent(&self, completed: usize) -> usize {
        (completed * 100) / self.total.max(1)
    }
}

/// Sending half used by workers to report finished units.
#[derive(Debug, Clone)]
pub struct AggregatorHandle {
    tx: mpsc::Sender<UnitReport>,
}

impl AggregatorHandle {
    /// Report a finished unit. Returns `false` once the collector is gone.
    pub async fn unit_done(&self, unit: UnitReport) -> bool {
        self.tx.send(unit).await.is_ok()
    }
}

/// Start the collector task for a run of `total` units.
///
/// The task finishes with the final report once every handle is dropped.
pub fn spawn_collector(total: usize, capacity: usize) -> (AggregatorHandle, JoinHandle<AggregateReport>) {
    let (tx, mut rx) = mpsc::channel::<UnitReport>(capacity.max(1));

    let collector = tokio::spawn(async move {
        let mut aggregator = Aggregator::new(total);
        let progress = Progress::new(total);

        while let Some(unit) = rx.recv().await {
            tracing::debug!(symbol = %unit.symbol, outcome = ?unit.outcome, "Unit completed");
            aggregator.apply(unit);

            let completed = aggregator.completed();
            let percent = progress.percent(completed);
            if progress.level(completed) == Level::INFO {
                tracing::info!(completed, total, percent, "Progress");
            } else {
                tracing::debug!(completed, total, percent, "Progress");
            }
        }

        aggregator.into_report()
    });

    (AggregatorHandle { tx }, collector)
}
