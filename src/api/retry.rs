use std::future::Future;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Run `operation` until it succeeds, fails permanently, or `max_retries`
/// retries are used up (so at most `max_retries + 1` calls).
///
/// Backoff is linear: retry `n` waits `base_delay * n`. Only
/// [`FetchError::is_retryable`] failures are retried. Cancelling `cancel`
/// during a backoff wait returns [`FetchError::Cancelled`].
pub async fn with_retry<T, F, Fut>(
    mut operation: F,
    max_retries: u32,
    base_delay: Duration,
    cancel: &CancellationToken,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut retries = 0u32;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("Succeeded after {} retries", retries);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            warn!("Not retrying: {}", error);
            return Err(error);
        }

        if retries >= max_retries {
            warn!("Giving up after {} attempts: {}", retries + 1, error);
            return Err(error);
        }

        retries += 1;
        let delay = base_delay * retries;
        warn!(
            "Attempt {} failed ({}), retrying in {:?}",
            retries, error, delay
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = time::sleep(delay) => {}
        }
    }
}
