//! Bounded-concurrency trend screen.
//!
//! A fixed set of worker tasks pulls symbols in input order from a shared
//! cursor. Each worker owns a [`WorkerContext`] holding the session it
//! acquired from the pool on its first symbol, and finishes one symbol
//! before taking the next. Finished units go to the collector task.
//!
//! Per-symbol failures, including panics inside a unit, become Failed
//! outcomes. A session that cannot be launched stops the whole run.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use screener_browser::{BrowserError, SessionLauncher, SessionPool, WorkerId};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::aggregator::{spawn_collector, AggregateReport, AggregatorHandle, UnitReport};
use crate::record::SymbolRecord;
use crate::screener::{filter_message, screen, skip_message, summary_line, FailureReason, ScreenOutcome};
use crate::source::DataSource;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("session unavailable: {0}")]
    Session(#[from] BrowserError),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("collector task failed: {0}")]
    Collector(String),
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: AggregateReport,
    pub total: usize,
    pub sessions_created: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Fetch and classify one symbol.
pub async fn screen_symbol<S>(source: &S, record: SymbolRecord) -> UnitReport
where
    S: DataSource + ?Sized,
{
    let symbol = record.symbol.clone();

    let metrics = match source.fetch(&symbol).await {
        Ok(metrics) => metrics,
        Err(failure) => {
            tracing::debug!(symbol = %symbol, reason = %failure, "Fetch failed");
            let reason = FailureReason::from(&failure);
            return UnitReport {
                lines: vec![skip_message(&symbol, reason)],
                outcome: ScreenOutcome::Failed(reason),
                symbol,
            };
        }
    };

    let price = record.price;
    match screen(record, &metrics) {
        Ok(screening) => {
            let mut lines = vec![summary_line(&symbol, price, &metrics, screening.percent_below_high)];
            if screening.outcome == ScreenOutcome::Filtered {
                lines.push(filter_message(&symbol));
            }
            UnitReport {
                symbol,
                outcome: screening.outcome,
                lines,
            }
        }
        Err(e) => {
            tracing::warn!(symbol = %symbol, error = %e, "Corrupt input record");
            let reason = FailureReason::CorruptInput;
            UnitReport {
                lines: vec![skip_message(&symbol, reason)],
                outcome: ScreenOutcome::Failed(reason),
                symbol,
            }
        }
    }
}

/// Work shared by every worker of one run.
struct Dispatch {
    records: Arc<[SymbolRecord]>,
    cursor: AtomicUsize,
    abort: AtomicBool,
}

impl Dispatch {
    /// Claim the next record in input order.
    fn claim(&self) -> Option<&SymbolRecord> {
        if self.abort.load(Ordering::SeqCst) {
            return None;
        }
        self.records.get(self.cursor.fetch_add(1, Ordering::SeqCst))
    }
}

/// State owned by one worker for the whole run.
pub struct WorkerContext<L: SessionLauncher> {
    id: WorkerId,
    pool: Arc<SessionPool<L>>,
    session: Option<Arc<L::Session>>,
    aggregator: AggregatorHandle,
}

impl<L> WorkerContext<L>
where
    L: SessionLauncher,
    L::Session: DataSource,
{
    fn new(id: WorkerId, pool: Arc<SessionPool<L>>, aggregator: AggregatorHandle) -> Self {
        Self {
            id,
            pool,
            session: None,
            aggregator,
        }
    }

    async fn session(&mut self) -> Result<Arc<L::Session>, BrowserError> {
        if let Some(ref session) = self.session {
            return Ok(Arc::clone(session));
        }
        let session = self.pool.acquire(self.id).await?;
        self.session = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn run(mut self, dispatch: Arc<Dispatch>) -> Result<usize, BrowserError> {
        let mut processed = 0;

        while let Some(record) = dispatch.claim() {
            let session = match self.session().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(worker = %self.id, error = %e, "Session launch failed, aborting run");
                    dispatch.abort.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            };

            let symbol = record.symbol.clone();
            let unit = AssertUnwindSafe(screen_symbol(session.as_ref(), record.clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    tracing::error!(worker = %self.id, symbol = %symbol, "Unit of work panicked");
                    UnitReport {
                        lines: vec![skip_message(&symbol, FailureReason::Panicked)],
                        outcome: ScreenOutcome::Failed(FailureReason::Panicked),
                        symbol: symbol.clone(),
                    }
                });

            processed += 1;
            if !self.aggregator.unit_done(unit).await {
                break;
            }
        }

        tracing::debug!(worker = %self.id, processed, "Worker finished");
        Ok(processed)
    }
}

/// The trend screen over a pool of per-worker sessions.
pub struct TrendPipeline<L: SessionLauncher> {
    pool: Arc<SessionPool<L>>,
    workers: usize,
}

impl<L> TrendPipeline<L>
where
    L: SessionLauncher,
    L::Session: DataSource,
{
    /// Create a pipeline with `workers` concurrent workers (at least one).
    pub fn new(launcher: L, workers: usize) -> Self {
        Self {
            pool: Arc::new(SessionPool::new(launcher)),
            workers: workers.max(1),
        }
    }

    pub fn pool(&self) -> &SessionPool<L> {
        &self.pool
    }

    /// Screen every record, then close every session the run created.
    pub async fn run(&self, records: Vec<SymbolRecord>) -> Result<RunSummary, PipelineError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let total = records.len();
        let worker_count = self.workers.min(total);

        tracing::info!(total, workers = worker_count, "Trend screen started");

        let dispatch = Arc::new(Dispatch {
            records: records.into(),
            cursor: AtomicUsize::new(0),
            abort: AtomicBool::new(false),
        });
        let (aggregator, collector) = spawn_collector(total, self.workers * 2);

        let handles: Vec<_> = (0..worker_count)
            .map(|n| {
                let context = WorkerContext::new(WorkerId(n), Arc::clone(&self.pool), aggregator.clone());
                tokio::spawn(context.run(Arc::clone(&dispatch)))
            })
            .collect();
        drop(aggregator);

        let mut fatal = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    fatal.get_or_insert(PipelineError::Session(e));
                }
                Err(e) => {
                    fatal.get_or_insert(PipelineError::Worker(e.to_string()));
                }
            }
        }

        let released = self.pool.release_all().await;
        tracing::info!(released, "Sessions released");

        let report = collector
            .await
            .map_err(|e| PipelineError::Collector(e.to_string()));

        if let Some(err) = fatal {
            return Err(err);
        }
        let report = report?;

        let duration = clock.elapsed();
        tracing::info!(
            total,
            passed = report.passed_count(),
            failed = report.failed_count(),
            filtered = report.filtered_count(),
            duration_ms = duration.as_millis() as u64,
            "Trend screen finished"
        );

        Ok(RunSummary {
            report,
            total,
            sessions_created: self.pool.created(),
            started_at,
            finished_at: Utc::now(),
            duration,
        })
    }
}
