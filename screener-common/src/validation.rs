//! Configuration validation.
//!
//! Checks value ranges before a run starts so that a bad config file fails
//! at startup rather than halfway through a screen.

use thiserror::Error;

use crate::config::{Config, FetchConfig, ObservabilityConfig, PipelineConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration conflict: {reason}")]
    Conflict { reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if let Err(e) = self.pipeline.validate() {
            errors.push(e);
        }

        if let Err(e) = self.fetch.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("expected one of {:?}, got '{}'", LOG_LEVELS, self.log_level),
            });
        }

        if !LOG_FORMATS.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!(
                    "expected one of {:?}, got '{}'",
                    LOG_FORMATS, self.log_format
                ),
            });
        }

        Ok(())
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.workers == 0 {
            return Err(ValidationError::InvalidValue {
                field: "pipeline.workers".into(),
                reason: "at least one worker is required".into(),
            });
        }

        if self.input_stage.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "pipeline.input_stage".into(),
            });
        }

        if self.output_stage.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "pipeline.output_stage".into(),
            });
        }

        if self.input_stage == self.output_stage {
            return Err(ValidationError::Conflict {
                reason: format!(
                    "input and output stage are both '{}'; the screen would overwrite its own input",
                    self.input_stage
                ),
            });
        }

        Ok(())
    }
}

impl Validate for FetchConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !self.url_template.contains("{symbol}") {
            return Err(ValidationError::InvalidValue {
                field: "fetch.url_template".into(),
                reason: "must contain the {symbol} placeholder".into(),
            });
        }

        if self.region_selector.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "fetch.region_selector".into(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "fetch.timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: "fetch.poll_interval_ms".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(())
    }
}
