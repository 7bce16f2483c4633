//! Per-worker session pool.
//!
//! Every worker owns at most one session for the whole run. The pool keeps
//! an explicit map from worker identity to session so that teardown can
//! reach every session ever created, and so that a session is never handed
//! to two different workers.

use crate::error::BrowserError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identity of one pipeline worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// A long-lived automation session that must be closed explicitly.
#[async_trait]
pub trait ManagedSession: Send + Sync + 'static {
    /// Stable identifier, unique per launched session.
    fn id(&self) -> &str;

    /// Release the underlying resources.
    async fn close(&self) -> Result<(), BrowserError>;
}

/// Factory for sessions; called at most once per worker by the pool.
#[async_trait]
pub trait SessionLauncher: Send + Sync + 'static {
    type Session: ManagedSession;

    async fn launch(&self, worker: WorkerId) -> Result<Self::Session, BrowserError>;
}

/// Lazily populated map of worker sessions.
pub struct SessionPool<L: SessionLauncher> {
    launcher: L,
    sessions: Mutex<HashMap<WorkerId, Arc<L::Session>>>,
    created: AtomicUsize,
}

impl<L: SessionLauncher> SessionPool<L> {
    /// Create an empty pool.
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            sessions: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// Get the session bound to `worker`, launching it on first use.
    pub async fn acquire(&self, worker: WorkerId) -> Result<Arc<L::Session>, BrowserError> {
        if let Some(session) = self.sessions.lock().await.get(&worker) {
            return Ok(Arc::clone(session));
        }

        // Launch outside the lock so workers start their browsers in parallel.
        let session = Arc::new(self.launcher.launch(worker).await?);
        self.created.fetch_add(1, Ordering::SeqCst);

        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(&worker) {
            let existing = Arc::clone(existing);
            drop(sessions);
            tracing::warn!(%worker, "Session launched twice for one worker, closing the spare");
            if let Err(e) = session.close().await {
                tracing::warn!(%worker, error = %e, "Failed to close spare session");
            }
            return Ok(existing);
        }

        tracing::info!(%worker, session_id = %session.id(), "Session launched");
        sessions.insert(worker, Arc::clone(&session));
        Ok(session)
    }

    /// Number of sessions launched over the pool's lifetime.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of sessions currently registered.
    pub async fn active(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Close every registered session and empty the registry.
    ///
    /// Returns the number of sessions closed. Close failures are logged and
    /// do not stop the remaining sessions from being closed.
    pub async fn release_all(&self) -> usize {
        let sessions: Vec<(WorkerId, Arc<L::Session>)> =
            self.sessions.lock().await.drain().collect();

        let mut closed = 0;
        for (worker, session) in sessions {
            match session.close().await {
                Ok(()) => {
                    tracing::debug!(%worker, session_id = %session.id(), "Session closed");
                    closed += 1;
                }
                Err(e) => {
                    tracing::warn!(%worker, session_id = %session.id(), error = %e, "Failed to close session");
                }
            }
        }

        closed
    }
}
