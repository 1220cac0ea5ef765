use std::future::Future;
use std::time::Duration;

use eyre::{Result, eyre};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::live::source::handle::Source;
use alloy::primitives::BlockNumber;

/// Calls `fetch` until it succeeds, sleeping `retry_interval` between failures.
///
/// Gives up with [`EngineError::DeadlineExceeded`] once a failure is observed after
/// `deadline`, and with [`EngineError::Cancelled`] as soon as `cancel` fires.
/// An attempt still pending at `deadline` is abandoned and counts as a failure.
pub async fn fetch_with_retry<T, F, Fut>(
    cancel: &CancellationToken,
    deadline: Instant,
    retry_interval: Duration,
    mut fetch: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled.into()),
            outcome = tokio::time::timeout_at(deadline, fetch()) => match outcome {
                Ok(outcome) => outcome,
                Err(_) => Err(eyre!("attempt still pending at the deadline")),
            },
        };

        match outcome {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(attempts, elapsed = ?start.elapsed(), "Fetched after retrying");
                }
                return Ok(value);
            }
            Err(e) => {
                let now = Instant::now();
                if now > deadline {
                    return Err(EngineError::DeadlineExceeded {
                        attempts,
                        elapsed: now - start,
                        last_error: format!("{e:#}"),
                    }
                    .into());
                }
                tracing::warn!(attempts, "Fetch failed, retrying in {retry_interval:?}: {e:#}");
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled.into()),
            _ = tokio::time::sleep(retry_interval) => {}
        }
    }
}

/// Current head height, tolerating transient failures for up to `retry_deadline`.
pub async fn head_height_with_retry<S>(
    cancel: &CancellationToken,
    source: &S,
    retry_deadline: Duration,
    retry_interval: Duration,
) -> Result<BlockNumber>
where
    S: Source + ?Sized,
{
    let deadline = Instant::now() + retry_deadline;
    fetch_with_retry(cancel, deadline, retry_interval, || source.head_height()).await
}
