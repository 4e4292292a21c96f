//! Bounded retries for I/O calls.
//!
//! # Responsibilities
//! - Run an async operation up to `max_attempts` times
//! - Put every attempt under its own timeout
//! - Wait with jittered exponential backoff between attempts
//!
//! # Design Decisions
//! - Only provider and store calls are retried; searches are not
//! - The last failure is reported, tagged with the attempt count

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use super::backoff::calculate_backoff;
use super::timeouts::{with_timeout, TimedOut};
use crate::config::RetryConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// A single attempt with the given timeout.
    pub fn once(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            attempt_timeout,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: if config.enabled { config.max_attempts.max(1) } else { 1 },
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RetryError<E> {
    #[error("timed out after {attempts} attempt(s), {limit:?} each")]
    TimedOut { attempts: u32, limit: Duration },

    #[error("failed after {attempts} attempt(s): {last}")]
    Failed { attempts: u32, last: E },
}

/// Run `op` under `policy`, returning the first success or the last failure.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &'static str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let failure = match with_timeout(policy.attempt_timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => RetryError::Failed {
                attempts: attempt,
                last: err,
            },
            Err(TimedOut(limit)) => RetryError::TimedOut {
                attempts: attempt,
                limit,
            },
        };
        if attempt >= max_attempts {
            tracing::warn!(operation = label, attempts = attempt, error = %failure, "Giving up");
            return Err(failure);
        }

        let delay = calculate_backoff(attempt, policy.base_delay_ms, policy.max_delay_ms);
        tracing::info!(
            operation = label,
            attempt,
            delay = ?delay,
            error = %failure,
            "Retrying after failure"
        );
        metrics::record_retry(label);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
