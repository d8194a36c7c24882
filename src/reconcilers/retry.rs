// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff for throttled remote calls.
//!
//! A "too many requests" answer is not a failure of the domain being
//! processed: the step that was throttled is retried in place after a backoff
//! delay, while the steps already completed for that domain are left alone.
//! Retrying is bounded by an attempt ceiling and interruptible through a
//! [`CancellationToken`]. Every other error is returned immediately.

use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::constants::{
    THROTTLE_BACKOFF_MULTIPLIER, THROTTLE_INITIAL_INTERVAL_MILLIS, THROTTLE_MAX_ATTEMPTS,
    THROTTLE_MAX_INTERVAL_SECS, THROTTLE_RANDOMIZATION_FACTOR,
};
use crate::domain_errors::DomainError;
use crate::metrics;

/// How throttled steps are retried.
#[derive(Clone, Debug, PartialEq)]
pub struct ThrottlePolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Upper bound of any single delay
    pub max_interval: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
    /// Jitter applied to each delay (0.1 for ±10%)
    pub randomization_factor: f64,
    /// Total attempts of one step, the first call included
    pub max_attempts: u32,
}

impl Default for ThrottlePolicy {
    /// # Configuration
    ///
    /// - **Initial interval**: 5 seconds
    /// - **Max interval**: 60 seconds
    /// - **Multiplier**: 2.0
    /// - **Randomization**: ±10%
    /// - **Max attempts**: 10
    ///
    /// # Retry Schedule
    ///
    /// 1. 5s
    /// 2. 10s
    /// 3. 20s
    /// 4. 40s
    /// 5. 60s (capped at max interval)
    ///    6-9. 60s intervals, then the step fails with `RetriesExhausted`
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(THROTTLE_INITIAL_INTERVAL_MILLIS),
            max_interval: Duration::from_secs(THROTTLE_MAX_INTERVAL_SECS),
            multiplier: THROTTLE_BACKOFF_MULTIPLIER,
            randomization_factor: THROTTLE_RANDOMIZATION_FACTOR,
            max_attempts: THROTTLE_MAX_ATTEMPTS,
        }
    }
}

impl ThrottlePolicy {
    /// Replace the delay before the first retry.
    #[must_use]
    pub fn with_initial_interval(mut self, initial_interval: Duration) -> Self {
        self.initial_interval = initial_interval;
        self.max_interval = self.max_interval.max(initial_interval);
        self
    }

    /// Replace the attempt ceiling. Zero is treated as one attempt.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Start a fresh backoff sequence for one step.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            self.initial_interval,
            self.max_interval,
            self.multiplier,
            self.randomization_factor,
        )
    }
}

/// Simple exponential backoff implementation.
///
/// Provides exponential backoff with randomization (jitter) so that several
/// runs sharing an account do not retry in lockstep.
pub struct ExponentialBackoff {
    /// Current interval duration
    pub current_interval: Duration,
    /// Initial interval duration
    pub initial_interval: Duration,
    /// Maximum interval duration
    pub max_interval: Duration,
    /// Backoff multiplier (typically 2.0 for doubling)
    pub multiplier: f64,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub randomization_factor: f64,
}

impl ExponentialBackoff {
    fn new(
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            multiplier,
            randomization_factor,
        }
    }

    /// Get the next backoff interval and grow the following one.
    pub fn next_backoff(&mut self) -> Duration {
        let interval = self.current_interval;
        let jittered = self.apply_jitter(interval);

        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        jittered
    }

    /// Go back to the initial interval.
    pub fn reset(&mut self) {
        self.current_interval = self.initial_interval;
    }

    /// Apply randomization (jitter) to an interval.
    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let min = secs - delta;
        let max = secs + delta;

        let mut rng = rand::thread_rng();
        let jittered = rng.gen_range(min..=max);

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Retry one step while it is throttled.
///
/// # Arguments
///
/// * `policy` - Backoff and attempt ceiling
/// * `cancel` - Interrupts the wait between attempts
/// * `operation_name` - Human-readable step name for logs and metrics
/// * `operation` - Async function performing the step
///
/// # Errors
///
/// Returns:
/// - the step's own error if it is anything but [`DomainError::Throttled`]
/// - [`DomainError::RetriesExhausted`] once `max_attempts` calls were throttled
/// - [`DomainError::Cancelled`] if `cancel` fires before or during a wait
///
/// # Example
///
/// ```no_run
/// use domain_manager::domain_errors::DomainError;
/// use domain_manager::reconcilers::retry::{retry_throttled, ThrottlePolicy};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), DomainError> {
/// let cancel = CancellationToken::new();
/// let value = retry_throttled(
///     &ThrottlePolicy::default(),
///     &cancel,
///     "lookup domain api.example.com",
///     || async { Ok::<_, DomainError>(42) },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_throttled<T, F, Fut>(
    policy: &ThrottlePolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    mut operation: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let mut backoff = policy.backoff();
    let max_attempts = policy.max_attempts.max(1);
    let start_time = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "Throttled step succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if e.is_throttled() => {
                if attempt >= max_attempts {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "Still throttled at the attempt ceiling, giving up"
                    );
                    return Err(DomainError::RetriesExhausted {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                    });
                }

                let duration = backoff.next_backoff();
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    retry_after = ?duration,
                    "Too many requests, will retry"
                );
                metrics::record_throttle_retry(operation_name);

                if cancel.is_cancelled() {
                    return Err(DomainError::Cancelled {
                        operation: operation_name.to_string(),
                    });
                }

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        warn!(operation = operation_name, "Retry wait interrupted");
                        return Err(DomainError::Cancelled {
                            operation: operation_name.to_string(),
                        });
                    }
                    () = tokio::time::sleep(duration) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
