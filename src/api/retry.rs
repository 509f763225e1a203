//! Retry with exponential backoff for transient API failures.

use crate::error::CoachError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Whether an error is worth retrying.
pub trait Retriable {
    fn is_retriable(&self) -> bool;
}

impl Retriable for CoachError {
    fn is_retriable(&self) -> bool {
        match self {
            // Transport faults: the request may never have reached the
            // service, or timed out on the way back.
            CoachError::Http(e) => e.is_timeout() || e.is_connect(),
            // Rate limiting and transient server-side failures.
            CoachError::Api { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Run `op` once, then retry up to `max_retries` times on retriable
/// errors, sleeping `base_delay * 2^(retry-1)` before each retry.
/// Non-retriable errors and exhaustion surface the last error as-is.
pub async fn with_backoff<T, E, F, Fut>(
    label: &str,
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    E: Retriable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retries = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if retries < max_retries && e.is_retriable() => {
                retries += 1;
                let delay = base_delay * (1u32 << (retries - 1));
                warn!(
                    "{} failed, retry {}/{} in {:?}: {}",
                    label, retries, max_retries, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
