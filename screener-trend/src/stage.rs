//! The trend stage end to end: input artifact, screen, output artifact.

use anyhow::{Context, Result};
use screener_common::Config;

use crate::artifact::ArtifactStore;
use crate::fetcher::TrendLauncher;
use crate::orchestrator::{RunSummary, TrendPipeline};
use crate::record::SymbolRecord;

/// Run the stage with browser-backed fetching.
pub async fn run_trend_stage(config: &Config) -> Result<RunSummary> {
    let launcher = TrendLauncher::new(config.browser.clone(), config.fetch.clone());
    run_stage_with(config, TrendPipeline::new(launcher, config.pipeline.workers)).await
}

/// Run the stage with a prepared pipeline.
pub async fn run_stage_with<L>(config: &Config, pipeline: TrendPipeline<L>) -> Result<RunSummary>
where
    L: screener_browser::SessionLauncher,
    L::Session: crate::source::DataSource,
{
    let store = ArtifactStore::new(&config.pipeline.json_dir);

    let records: Vec<SymbolRecord> = store
        .open(&config.pipeline.input_stage)
        .with_context(|| format!("Failed to load stage '{}'", config.pipeline.input_stage))?;
    tracing::info!(
        stage = %config.pipeline.input_stage,
        records = records.len(),
        "Input artifact loaded"
    );

    let summary = pipeline.run(records).await.context("Trend screen aborted")?;

    let path = store
        .create(&config.pipeline.output_stage, &summary.report.passed)
        .with_context(|| format!("Failed to write stage '{}'", config.pipeline.output_stage))?;
    tracing::info!(path = %path.display(), passed = summary.report.passed_count(), "Output artifact written");

    Ok(summary)
}
