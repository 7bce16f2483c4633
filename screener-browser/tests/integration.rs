//! Integration tests for screener-browser.
//!
//! Drives the session pool from many concurrent tasks with an in-memory
//! launcher; no Chromium process is started.

use async_trait::async_trait;
use screener_browser::{BrowserError, ManagedSession, SessionLauncher, SessionPool, WorkerId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct CountingSession {
    id: String,
    closes: AtomicUsize,
}

#[async_trait]
impl ManagedSession for CountingSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct CountingLauncher {
    launches: AtomicUsize,
}

#[async_trait]
impl SessionLauncher for CountingLauncher {
    type Session = CountingSession;

    async fn launch(&self, worker: WorkerId) -> Result<CountingSession, BrowserError> {
        let n = self.launches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(CountingSession {
            id: format!("{worker}/{n}"),
            closes: AtomicUsize::new(0),
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_tasks_few_workers() {
    const WORKERS: usize = 3;
    const TASKS_PER_WORKER: usize = 20;

    let pool = Arc::new(SessionPool::new(CountingLauncher::default()));
    let seen: Arc<Mutex<HashMap<WorkerId, Vec<String>>>> = Arc::default();

    let mut handles = Vec::new();
    for w in 0..WORKERS {
        let pool = Arc::clone(&pool);
        let seen = Arc::clone(&seen);
        handles.push(tokio::spawn(async move {
            let worker = WorkerId(w);
            for _ in 0..TASKS_PER_WORKER {
                let session = pool.acquire(worker).await.unwrap();
                seen.lock()
                    .unwrap()
                    .entry(worker)
                    .or_default()
                    .push(session.id().to_string());
                tokio::task::yield_now().await;
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(pool.created(), WORKERS);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), WORKERS);
    let mut distinct = Vec::new();
    for ids in seen.values() {
        assert_eq!(ids.len(), TASKS_PER_WORKER);
        assert!(ids.iter().all(|id| id == &ids[0]), "session changed mid-run");
        distinct.push(ids[0].clone());
    }
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), WORKERS);
}

#[tokio::test]
async fn test_teardown_closes_every_session_exactly_once() {
    let pool = SessionPool::new(CountingLauncher::default());

    let sessions: Vec<_> = acquire_for_workers(&pool, 4).await;
    assert_eq!(pool.release_all().await, 4);
    assert_eq!(pool.release_all().await, 0);

    for session in sessions {
        assert_eq!(session.closes.load(Ordering::SeqCst), 1);
    }
}

async fn acquire_for_workers(
    pool: &SessionPool<CountingLauncher>,
    workers: usize,
) -> Vec<Arc<CountingSession>> {
    let mut sessions = Vec::with_capacity(workers);
    for w in 0..workers {
        sessions.push(pool.acquire(WorkerId(w)).await.unwrap());
    }
    sessions
}
