//! Headless Chromium sessions driven over CDP.

use crate::browser::pool::{ManagedSession, SessionLauncher, WorkerId};
use crate::browser::wait::navigate_and_wait;
use crate::error::BrowserError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use screener_common::config::BrowserConfig;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

/// Script that halts any loading still in progress.
const STOP_LOADING: &str = "window.stop();";

/// Command-line flags passed to Chromium on top of the client defaults.
fn launch_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = Vec::new();

    if config.headless {
        args.push("--headless".to_string());
    }

    if config.disable_gpu {
        args.push("--disable-gpu".to_string());
    }

    args.extend(config.extra_args.iter().cloned());
    args
}

/// Build the Chromium launch configuration.
fn cdp_config(config: &BrowserConfig) -> Result<CdpBrowserConfig, BrowserError> {
    // Headless mode comes from `launch_args`, so the builder never adds its own.
    let mut builder = CdpBrowserConfig::builder()
        .with_head()
        .window_size(config.viewport.width, config.viewport.height);

    if let Some(ref executable) = config.executable {
        builder = builder.chrome_executable(executable);
    }

    for arg in launch_args(config) {
        builder = builder.arg(arg);
    }

    builder.build().map_err(BrowserError::LaunchFailed)
}

/// Launches one Chromium process per worker.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = BrowserSession;

    async fn launch(&self, worker: WorkerId) -> Result<BrowserSession, BrowserError> {
        BrowserSession::launch(worker, &self.config).await
    }
}

/// A Chromium process with a single page, owned by one worker.
pub struct BrowserSession {
    id: String,
    worker: WorkerId,
    created_at: DateTime<Utc>,
    eager_load: bool,
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Start Chromium and open a blank page.
    pub async fn launch(worker: WorkerId, config: &BrowserConfig) -> Result<Self, BrowserError> {
        let (mut browser, mut handler) = Browser::launch(cdp_config(config)?)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(BrowserError::LaunchFailed(e.to_string()));
            }
        };

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            worker,
            created_at: Utc::now(),
            eager_load: config.eager_load,
            browser: Mutex::new(Some(browser)),
            page,
            handler,
        })
    }

    /// Navigate to `url` and return the document HTML once `selector`
    /// matches an element.
    ///
    /// Navigation, the wait for `selector` and reading the document all
    /// share the `timeout` budget. Loading is halted as soon as the element
    /// is present, or when the budget runs out.
    pub async fn load_when_ready(
        &self,
        url: &str,
        selector: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<String, BrowserError> {
        let parsed = Url::parse(url).map_err(|e| BrowserError::InvalidUrl(format!("{url}: {e}")))?;

        if self.browser.lock().await.is_none() {
            return Err(BrowserError::Closed(self.id.clone()));
        }

        let deadline = Instant::now() + timeout;
        let timed_out = || BrowserError::NavigationTimeout {
            url: url.to_string(),
            selector: selector.to_string(),
        };

        let ready = navigate_and_wait(deadline, poll_interval, self.navigate(parsed.as_str()), || {
            let page = self.page.clone();
            let selector = selector.to_string();
            async move { page.find_element(selector).await.is_ok() }
        })
        .await;

        if let Err(e) = self.page.evaluate(STOP_LOADING).await {
            tracing::debug!(session_id = %self.id, error = %e, "window.stop() failed");
        }

        match ready {
            Ok(true) => {}
            Ok(false) => return Err(timed_out()),
            Err(e) => return Err(BrowserError::from(e).during_load(url, selector)),
        }

        match tokio::time::timeout_at(deadline, self.page.content()).await {
            Ok(html) => html.map_err(|e| BrowserError::from(e).during_load(url, selector)),
            Err(_) => Err(timed_out()),
        }
    }

    /// Issue the navigation. With eager loading the page is handed back as
    /// soon as Chromium commits it; otherwise the load event is awaited too.
    async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        self.page.goto(url).await?;
        if !self.eager_load {
            self.page.wait_for_navigation().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ManagedSession for BrowserSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Err(BrowserError::Closed(self.id.clone()));
        };

        let result = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::debug!(session_id = %self.id, error = %e, "Waiting for Chromium exit failed");
        }
        self.handler.abort();

        tracing::debug!(
            session_id = %self.id,
            worker = %self.worker,
            lifetime_secs = (Utc::now() - self.created_at).num_seconds(),
            "Chromium closed"
        );

        result.map(|_| ()).map_err(BrowserError::from)
    }
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("id", &self.id)
            .field("worker", &self.worker)
            .field("created_at", &self.created_at)
            .field("eager_load", &self.eager_load)
            .finish_non_exhaustive()
    }
}
