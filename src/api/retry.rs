//! Bounded exponential backoff for transient failures

use std::{fmt, future::Future, time::Duration};
use tokio::time::sleep;

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between attempts.
    pub max_backoff: Duration,
    /// Multiplier applied after each failed attempt.
    pub multiplier: u32,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2,
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    /// Policy that makes a single attempt
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Run `operation`, retrying errors accepted by `should_retry`.
///
/// Returns the first success, a non-retriable error as soon as it occurs, or
/// the last error once `max_retries` retries are used up.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut backoff = policy.initial_backoff;

    for attempt in 1..=policy.max_retries {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if should_retry(&err) => {
                tracing::warn!(
                    error = %err,
                    attempt,
                    max_retries = policy.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Transient failure, retrying"
                );
                crate::telemetry::increment(crate::telemetry::CounterMetric::Retries, 1);
                sleep(backoff).await;
                backoff = (backoff * policy.multiplier).min(policy.max_backoff);
            }
            Err(err) => return Err(err),
        }
    }

    operation().await
}
