//! Logging setup for the screener binaries.
//!
//! # Noise Filtering
//!
//! The CDP client and the HTML parser log every websocket frame and
//! tokenizer decision at debug level. Those modules are held at `warn`
//! while business logs stay at the configured level.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Default noisy modules that should be filtered to warn level.
pub const NOISY_MODULES: &[&str] = &[
    "chromiumoxide",
    "tungstenite",
    "async_tungstenite",
    "hyper",
    "html5ever",
    "selectors",
    "tokio_util",
];

/// Build the filter directives for a base level plus the quiet modules.
fn build_directives(log_level: &str, excluded_targets: &[String]) -> String {
    let mut directives = String::from(log_level);

    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }

    for target in excluded_targets {
        directives.push_str(&format!(",{}=warn", target));
    }

    directives
}

/// Initialize logging with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let directives = build_directives(&config.log_level, &config.excluded_targets);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::info!(
        log_level = %config.log_level,
        log_format = %config.log_format,
        noise_filtered = NOISY_MODULES.len() + config.excluded_targets.len(),
        "Logging initialized"
    );
}
