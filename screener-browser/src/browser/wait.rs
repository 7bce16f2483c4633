//! Bounded waiting on page conditions.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Poll `check` every `interval` until it reports `true` or `timeout` elapses.
///
/// Returns `true` when the condition was met in time. A check that never
/// completes is cut off by the timeout as well.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let wait = async {
        loop {
            if check().await {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(timeout, wait).await.is_ok()
}

/// Run `navigate`, then poll `check`, both inside one budget ending at `deadline`.
///
/// Returns `Ok(false)` when the deadline passes first, whether navigation
/// was still pending or the condition never held. Navigation errors are
/// returned as they are.
pub async fn navigate_and_wait<N, E, F, Fut>(
    deadline: Instant,
    interval: Duration,
    navigate: N,
    check: F,
) -> Result<bool, E>
where
    N: Future<Output = Result<(), E>>,
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    match tokio::time::timeout_at(deadline, navigate).await {
        Err(_) => return Ok(false),
        Ok(Err(e)) => return Err(e),
        Ok(Ok(())) => {}
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    Ok(poll_until(remaining, interval, check).await)
}
