//! Error types for screener-browser.

use chromiumoxide::error::CdpError;

/// Browser session errors.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation timeout: {url} (waiting for {selector})")]
    NavigationTimeout { url: String, selector: String },

    #[error("Navigation failed: {url} - {reason}")]
    Navigation { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("CDP command failed: {0}")]
    Cdp(String),

    #[error("Session closed: {0}")]
    Closed(String),
}

impl BrowserError {
    /// Whether the error ends a whole run rather than one page load.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::LaunchFailed(_))
    }

    /// Whether the wait for page content ran out of time.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::NavigationTimeout { .. })
    }
}

impl BrowserError {
    /// Attach the page being loaded to an error raised while loading it.
    pub fn during_load(self, url: &str, selector: &str) -> Self {
        match self {
            Self::NavigationTimeout { .. } => Self::NavigationTimeout {
                url: url.to_string(),
                selector: selector.to_string(),
            },
            Self::Cdp(reason) => Self::Navigation {
                url: url.to_string(),
                reason,
            },
            other => other,
        }
    }
}

impl From<CdpError> for BrowserError {
    fn from(err: CdpError) -> Self {
        match err {
            // A CDP request that never got an answer, e.g. a stalled navigation.
            CdpError::Timeout => Self::NavigationTimeout {
                url: String::new(),
                selector: String::new(),
            },
            other => Self::Cdp(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::NavigationTimeout {
            url: "https://example.com/pivot-points/AAPL".to_string(),
            selector: "td.ma10".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Navigation timeout: https://example.com/pivot-points/AAPL (waiting for td.ma10)"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(BrowserError::LaunchFailed("no chromium".into()).is_fatal());
        assert!(!BrowserError::Cdp("closed pipe".into()).is_fatal());
        assert!(BrowserError::NavigationTimeout {
            url: String::new(),
            selector: String::new(),
        }
        .is_timeout());
    }

    #[test]
    fn test_cdp_request_timeout_is_a_navigation_timeout() {
        let err = BrowserError::from(CdpError::Timeout);
        assert!(err.is_timeout(), "classified as {err:?}");

        let err = err.during_load("https://example.com/pivot-points/MSFT", "td.ma10");
        assert_eq!(
            err.to_string(),
            "Navigation timeout: https://example.com/pivot-points/MSFT (waiting for td.ma10)"
        );
    }

    #[test]
    fn test_other_cdp_failures_become_navigation_errors() {
        let err = BrowserError::from(CdpError::NotFound);
        assert!(!err.is_timeout());
        assert!(matches!(
            err.during_load("https://example.com/x", "td.ma10"),
            BrowserError::Navigation { ref url, .. } if url == "https://example.com/x"
        ));
    }

    #[test]
    fn test_during_load_keeps_unrelated_errors() {
        let err = BrowserError::Closed("session-1".into()).during_load("https://example.com", "td");
        assert!(matches!(err, BrowserError::Closed(_)));
    }
}
