//! Error types shared by the screener crates.

use thiserror::Error;

/// Result type alias using the screener error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for screener I/O and configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is a not-found error, looking through context layers.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::InvalidInput("bad row".into());
        let with_ctx = err.with_context("reading liquidity.json");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(
            with_ctx.to_string(),
            "reading liquidity.json: Invalid input: bad row"
        );
    }

    #[test]
    fn test_not_found_through_context() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let result: std::result::Result<(), std::io::Error> = Err(io);
        let err = result.context("opening artifact").unwrap_err();
        assert!(err.is_not_found());
        assert!(!Error::InvalidInput("bad row".into()).is_not_found());
    }
}
