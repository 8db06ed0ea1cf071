//! Retry-with-budget for HTTP steps
//!
//! Every HTTP step of every operation goes through [`with_budget`]: attempts
//! are immediate and sequential, only [`Error::Http`] is retried, and the
//! last failure is surfaced with the step name as prefix.

use std::future::Future;
use tracing::warn;

use crate::error::{Error, Result};

/// Run `op` up to `attempts` times (at least once)
///
/// # Returns
///
/// - `Ok(T)`: first successful attempt
/// - `Err(Error::Transport)`: every attempt failed with a retryable error
/// - `Err(e)`: the first non-retryable error, unchanged
pub async fn with_budget<T, F, Fut>(attempts: usize, step: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                warn!("{} failed (attempt {}/{}): {}", step, attempt, attempts, e);
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    let detail = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempt made".to_string());
    Err(Error::transport(step, detail))
}
