//! Retry with exponential backoff for transient fetch failures.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Rate limiting, network failures and server-side (5xx) errors are worth
/// another attempt; everything else would fail the same way again.
fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::RateLimited { .. } | FetchError::Http(_) => true,
        FetchError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        _ => false,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` more
/// times.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds, or the server's `Retry-After` when that is longer. Non-retriable
/// errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let backoff_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        let delay_secs = match &err {
            FetchError::RateLimited {
                retry_after_secs, ..
            } => backoff_secs.max(*retry_after_secs),
            _ => backoff_secs,
        };
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient fetch error; retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
