// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::{retry_throttled, ThrottlePolicy};
    use crate::domain_errors::{DomainError, RegistrarError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn fast_policy(max_attempts: u32) -> ThrottlePolicy {
        ThrottlePolicy {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_attempts,
        }
    }

    fn throttled() -> DomainError {
        DomainError::Throttled {
            operation: "CreateDomainName".to_string(),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = ThrottlePolicy::default();

        assert_eq!(policy.initial_interval, Duration::from_secs(5));
        assert_eq!(policy.max_interval, Duration::from_secs(60));
        assert_eq!(policy.max_attempts, 10);

        #[allow(clippy::float_cmp)]
        {
            assert_eq!(policy.multiplier, 2.0);
            assert_eq!(policy.randomization_factor, 0.1);
        }
    }

    #[test]
    fn test_backoff_grows_until_capped() {
        let policy = ThrottlePolicy {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_attempts: 10,
        };
        let mut backoff = policy.backoff();

        assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(20));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(30));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(30));

        backoff.reset();
        assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let mut backoff = ThrottlePolicy::default().backoff();

        for _ in 0..20 {
            backoff.reset();
            let delay = backoff.next_backoff();
            assert!(delay >= Duration::from_millis(4500), "{delay:?} below -10%");
            assert!(delay <= Duration::from_millis(5500), "{delay:?} above +10%");
        }
    }

    #[test]
    fn test_policy_builders() {
        let policy = ThrottlePolicy::default()
            .with_initial_interval(Duration::from_secs(120))
            .with_max_attempts(0);

        assert_eq!(policy.initial_interval, Duration::from_secs(120));
        assert_eq!(policy.max_interval, Duration::from_secs(120));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_throttle_retries_same_step_once() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result = retry_throttled(&fast_policy(5), &cancel, "create domain", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(throttled())
                } else {
                    Ok("created")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "created");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "exactly one retry expected");
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Result<(), DomainError> =
            retry_throttled(&fast_policy(5), &cancel, "delete domain", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(DomainError::Registrar(RegistrarError::DeleteFailed {
                        domain: "api.example.com".to_string(),
                        reason: "boom".to_string(),
                    }))
                }
            })
            .await;

        assert!(matches!(result, Err(DomainError::Registrar(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Result<(), DomainError> =
            retry_throttled(&fast_policy(5), &cancel, "lookup domain", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(DomainError::NotFound {
                        resource: "Domain api.example.com".to_string(),
                    })
                }
            })
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_at_ceiling() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Result<(), DomainError> =
            retry_throttled(&fast_policy(3), &cancel, "create domain", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttled()) }
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            DomainError::RetriesExhausted {
                operation: "create domain".to_string(),
                attempts: 3,
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_retrying() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), DomainError> =
            retry_throttled(&fast_policy(10), &cancel, "create domain", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttled()) }
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            DomainError::Cancelled {
                operation: "create domain".to_string(),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_wait() {
        let cancel = CancellationToken::new();
        let policy = ThrottlePolicy {
            initial_interval: Duration::from_secs(3600),
            max_interval: Duration::from_secs(3600),
            multiplier: 1.0,
            randomization_factor: 0.0,
            max_attempts: 10,
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result: Result<(), DomainError> =
            retry_throttled(&policy, &cancel, "create domain", || async {
                Err(throttled())
            })
            .await;

        assert!(matches!(result, Err(DomainError::Cancelled { .. })));
    }
}
