// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff for provider API calls.
//!
//! Transient failures (network errors, timeouts, 429, 5xx) are retried with
//! exponential backoff and jitter. Everything else fails fast: a conflict
//! routes to the lookup-then-update path, and a rejection is terminal for the
//! record. The backoff sleep suspends only the calling record's apply path,
//! never the whole reconciliation.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::RngExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::constants::{
    MAX_APPLY_ATTEMPTS, RETRY_INITIAL_INTERVAL_SECS, RETRY_MULTIPLIER,
    RETRY_RANDOMIZATION_FACTOR,
};
use crate::errors::ProviderError;

/// Retry schedule for provider operations.
///
/// The default is 3 attempts with sleeps of ~1s and ~2s between them (base 1s,
/// doubling, ±10% jitter). Tests inject millisecond intervals instead.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts, counting the first one
    pub max_attempts: u32,
    /// Sleep before the first retry
    pub initial_interval: Duration,
    /// Backoff multiplier (typically 2.0 for doubling)
    pub multiplier: f64,
    /// Randomization factor (e.g. 0.1 for ±10%); 0.0 disables jitter
    pub randomization_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_APPLY_ATTEMPTS,
            initial_interval: Duration::from_secs(RETRY_INITIAL_INTERVAL_SECS),
            multiplier: RETRY_MULTIPLIER,
            randomization_factor: RETRY_RANDOMIZATION_FACTOR,
        }
    }
}

/// Simple exponential backoff interval generator.
pub struct ExponentialBackoff {
    current_interval: Duration,
    multiplier: f64,
    randomization_factor: f64,
}

impl ExponentialBackoff {
    /// Start a backoff sequence from a policy's initial interval.
    #[must_use]
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            current_interval: policy.initial_interval,
            multiplier: policy.multiplier,
            randomization_factor: policy.randomization_factor,
        }
    }

    /// Get the next sleep interval and advance the sequence.
    pub fn next_backoff(&mut self) -> Duration {
        let interval = self.current_interval;
        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next);
        self.apply_jitter(interval)
    }

    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let min = secs - delta;
        let max = secs + delta;

        let mut rng = rand::rng();
        let jittered = rng.random_range(min..=max);

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Retry a provider call with exponential backoff.
///
/// Only transient errors are retried. A conflict or rejection returns
/// immediately so the caller can branch on it; retrying a conflict as if it
/// were transient would just re-fail the same create.
///
/// Cancellation is checked before each attempt and during each backoff sleep;
/// a fired token turns the whole call into [`ProviderError::Cancelled`].
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, the first
/// non-transient error encountered, or `Cancelled`.
pub async fn retry_provider_call<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut backoff = ExponentialBackoff::new(policy);
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let result = tokio::select! {
            () = cancel.cancelled() => return Err(ProviderError::Cancelled),
            result = operation() => result,
        };

        match result {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt,
                        elapsed = ?start_time.elapsed(),
                        "provider call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() => {
                debug!(
                    operation = operation_name,
                    error = %e,
                    "non-retryable provider error, failing immediately"
                );
                return Err(e);
            }
            Err(e) => {
                if attempt >= policy.max_attempts {
                    error!(
                        operation = operation_name,
                        attempt,
                        elapsed = ?start_time.elapsed(),
                        error = %e,
                        "retries exhausted, giving up"
                    );
                    return Err(e);
                }

                let duration = backoff.next_backoff();
                warn!(
                    operation = operation_name,
                    attempt,
                    retry_after = ?duration,
                    error = %e,
                    "transient provider error, will retry"
                );
                tokio::select! {
                    () = cancel.cancelled() => return Err(ProviderError::Cancelled),
                    () = tokio::time::sleep(duration) => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
