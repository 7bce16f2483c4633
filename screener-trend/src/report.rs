//! Console report for the trend stage.

use crate::aggregator::AggregateReport;

pub fn header(stage_number: u32) -> String {
    format!("\n****** Begin Stage {stage_number} [Trend] ******\n")
}

pub fn footer(stage_number: u32) -> String {
    format!("\n****** Stage {stage_number} [Trend] Finished ******\n")
}

/// The three outcome counts, one per line.
pub fn summary(report: &AggregateReport) -> String {
    format!(
        "{} symbols failed (insufficient data).\n\
         {} symbols filtered (not in stage-2 uptrend).\n\
         {} symbols passed.",
        report.failed_count(),
        report.filtered_count(),
        report.passed_count(),
    )
}

/// Per-symbol log followed by the summary counts.
pub fn render(report: &AggregateReport) -> String {
    if report.log.is_empty() {
        return summary(report);
    }
    format!("{}\n\n{}", report.log_text(), summary(report))
}
