//! Configuration management for the screener.
//!
//! The screener reads a single configuration file at
//! `~/.growth-screener/config.json`. Every field has a default, so a missing
//! file (or a missing section) runs the trend stage with the stock settings.
//!
//! # Sections
//!
//! - `observability` → log level, log format, extra quiet targets
//! - `pipeline` → worker count, artifact directory, stage names
//! - `fetch` → remote page URL template, selector and timeout
//! - `browser` → headless Chromium launch options

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".growth-screener"),
        |dirs| dirs.home_dir().join(".growth-screener"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration shared by every screener crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Stage pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Remote indicator page configuration
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Browser launch configuration
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Aliases: "level" for backward compatibility with existing config files
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    /// Aliases: "format" for backward compatibility with existing config files
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets held at `warn`, on top of the built-in
    /// noisy modules.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Pipeline
// ============================================================================

/// Stage pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent workers, each owning one browser session
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directory holding the stage artifacts, relative to the working directory
    #[serde(default = "default_json_dir")]
    pub json_dir: PathBuf,

    /// Stage whose artifact feeds the trend screen
    #[serde(default = "default_input_stage")]
    pub input_stage: String,

    /// Stage name the trend screen writes
    #[serde(default = "default_output_stage")]
    pub output_stage: String,

    /// Position of the trend screen in the pipeline (console header only)
    #[serde(default = "default_stage_number")]
    pub stage_number: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            json_dir: default_json_dir(),
            input_stage: default_input_stage(),
            output_stage: default_output_stage(),
            stage_number: default_stage_number(),
        }
    }
}

fn default_workers() -> usize {
    10
}

fn default_json_dir() -> PathBuf {
    PathBuf::from("backend").join("json")
}

fn default_input_stage() -> String {
    "liquidity".to_string()
}

fn default_output_stage() -> String {
    "trend".to_string()
}

fn default_stage_number() -> u32 {
    3
}

// ============================================================================
// Fetch
// ============================================================================

/// Remote indicator page configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Page URL; `{symbol}` is replaced by the ticker
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// CSS selector of the moving-average table region to wait for
    #[serde(default = "default_region_selector")]
    pub region_selector: String,

    /// Upper bound on the wait for the table region
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between two checks of the table region
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl FetchConfig {
    /// Build the page URL for a symbol.
    pub fn url_for(&self, symbol: &str) -> String {
        self.url_template.replace("{symbol}", symbol)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            region_selector: default_region_selector(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_url_template() -> String {
    "https://www.movingaverages.com/pivot-points/{symbol}".to_string()
}

fn default_region_selector() -> String {
    "table tbody td.ma10".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    250
}

// ============================================================================
// Browser
// ============================================================================

/// Headless browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_true")]
    pub disable_gpu: bool,

    /// Stop waiting on navigation once the document is committed instead of
    /// waiting for the load event
    #[serde(default = "default_true")]
    pub eager_load: bool,

    /// Chromium executable; auto-detected when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Extra command line switches passed to Chromium
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            disable_gpu: true,
            eager_load: true,
            executable: None,
            viewport: default_viewport(),
            extra_args: Vec::new(),
        }
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_stage_settings() {
        let config = Config::default();
        assert_eq!(config.pipeline.workers, 10);
        assert_eq!(config.pipeline.input_stage, "liquidity");
        assert_eq!(config.pipeline.output_stage, "trend");
        assert_eq!(config.fetch.timeout_secs, 120);
        assert!(config.browser.headless);
        assert!(config.browser.disable_gpu);
        assert!(config.browser.eager_load);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pipeline": {{"workers": 4}}, "observability": {{"level": "debug"}}}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.output_stage, "trend");
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "pretty");
        assert_eq!(config.fetch.poll_interval_ms, 250);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_url_for_symbol() {
        let fetch = FetchConfig::default();
        assert_eq!(
            fetch.url_for("NVDA"),
            "https://www.movingaverages.com/pivot-points/NVDA"
        );
    }
}
