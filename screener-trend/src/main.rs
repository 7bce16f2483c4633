//! Growth Screener - trend stage.
//!
//! Screens the liquidity stage's symbols for a stage-2 uptrend.

use anyhow::{Context, Result};
use screener_common::config::Config;
use screener_common::logging::init_logging;
use screener_trend::{report, run_trend_stage};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate().context("Invalid configuration")?;

    init_logging(&config.observability);
    tracing::info!("Growth Screener trend stage v{}", env!("CARGO_PKG_VERSION"));

    let stage = config.pipeline.stage_number;
    println!("{}", report::header(stage));

    let summary = run_trend_stage(&config).await?;

    println!("{}", report::render(&summary.report));
    println!("{}", report::footer(stage));
    Ok(())
}
