//! Per-attempt deadline enforcement and bounded retry around one provider call.
//!
//! Both layers settle with `Result` values, never panics, so the orchestrator
//! joins outcomes without any per-provider exception handling.

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

/// Default attempt ceiling used by the HTTP and CLI paths.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Races one operation against a deadline.
///
/// The operation is spawned as its own task; if the timer fires first the task
/// is detached, not aborted; it may run to completion in the background and
/// its eventual result is discarded. The caller observes exactly one
/// settlement, no later than `timeout` plus scheduling slack. `label` only
/// feeds the timeout error message.
///
/// # Errors
///
/// Returns [`ProviderError::Timeout`] when the deadline fires first, or the
/// operation's own error when it fails in time.
pub async fn with_deadline<T, F>(
    operation: F,
    timeout: Duration,
    label: &str,
) -> Result<T, ProviderError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ProviderError>> + Send + 'static,
{
    let handle = tokio::spawn(operation);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ProviderError::transport(format!(
            "{label} task failed: {join_err}"
        ))),
        Err(_elapsed) => Err(ProviderError::Timeout {
            label: label.to_string(),
            after: timeout,
        }),
    }
}

/// Re-issues one logical request up to `max_attempts` times.
///
/// The factory must produce a fresh future per attempt; adapters build a new
/// HTTP call each time, an already-polled future cannot be re-awaited.
/// Attempts run strictly sequentially, each under its own [`with_deadline`];
/// the first success wins, and once the ceiling is reached the *last* failure
/// is returned. No backoff between attempts, and no differentiation by error
/// kind: timeouts, rejections, and malformed bodies are all retried uniformly.
///
/// # Errors
///
/// Returns the final attempt's error once the ceiling is reached.
pub async fn with_retries<T, F, Fut>(
    label: &str,
    mut operation_factory: F,
    max_attempts: u32,
    per_attempt_timeout: Duration,
) -> Result<T, ProviderError>
where
    T: Send + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
{
    let attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        match with_deadline(operation_factory(), per_attempt_timeout, label).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "attempt failed"
                );
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ProviderError::transport(format!("{label}: no attempts made"))))
}
