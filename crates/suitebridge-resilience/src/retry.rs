// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy and the call wrapper applied at every backend call site.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use suitebridge_config::RetryConfig;
use suitebridge_core::{BackendFailure, DiagnosticEvent, DiagnosticSink, SuitebridgeError};
use tracing::{debug, warn};

use crate::classify::{Classified, Operation, RetryClass, classify};

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempt limit (first call included) for [`RetryClass::Always`].
    pub max_attempts: u32,
    /// Attempt limit for [`RetryClass::IdempotentOnly`] on idempotent reads.
    pub fault_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            fault_attempts: config.fault_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            fault_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Total attempts allowed for a failure of `class` during `op`.
    pub fn attempts_for(&self, class: RetryClass, op: &Operation) -> u32 {
        match class {
            RetryClass::Always => self.max_attempts,
            RetryClass::IdempotentOnly if op.idempotent => self.fault_attempts,
            _ => 1,
        }
    }

    /// Delay before retry number `attempt` (1 = first retry).
    ///
    /// A backend retry-after hint replaces the computed backoff. Both are
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = retry_after.unwrap_or_else(|| {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            self.base_delay.saturating_mul(factor)
        });
        backoff.min(self.max_delay)
    }
}

/// Wraps backend calls: applies the per-call timeout, classifies failures, and
/// retries per the [`RetryPolicy`].
#[derive(Clone)]
pub struct ErrorTranslator {
    policy: RetryPolicy,
    sink: Arc<dyn DiagnosticSink>,
}

impl ErrorTranslator {
    pub fn new(policy: RetryPolicy, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { policy, sink }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Classifies a failure without retrying, for per-identity results.
    pub fn translate(&self, failure: &BackendFailure, op: &Operation) -> SuitebridgeError {
        classify(failure, op).error
    }

    /// Runs `call` until it succeeds or its failure may no longer be retried.
    pub async fn call<T, F, Fut>(&self, op: &Operation, mut call: F) -> Result<T, SuitebridgeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendFailure>>,
    {
        let mut attempt = 1u32;
        loop {
            let outcome = match op.timeout {
                Some(deadline) => match tokio::time::timeout(deadline, call()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(BackendFailure::timeout(format!(
                        "{} exceeded {deadline:?}",
                        op.name
                    ))),
                },
                None => call().await,
            };

            let failure = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = %op.name, attempt, "backend call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let Classified { error, retry } = classify(&failure, op);
            let limit = self.policy.attempts_for(retry, op);
            if attempt >= limit {
                warn!(
                    operation = %op.name,
                    attempt,
                    kind = %error.kind(),
                    failure = %failure,
                    "backend call failed"
                );
                return Err(error);
            }

            let delay = self.policy.delay_for(attempt, error.retry_after());
            self.sink.emit(DiagnosticEvent::Retry {
                operation: op.name.clone(),
                attempt,
                kind: error.kind(),
                delay,
            });
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl std::fmt::Debug for ErrorTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorTranslator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use suitebridge_core::{ErrorKind, TracingSink};

    use super::*;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<DiagnosticEvent>>);

    impl DiagnosticSink for RecordingSink {
        fn emit(&self, event: DiagnosticEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            fault_attempts: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }

    #[test]
    fn delay_doubles_and_caps() {
        let p = policy();
        assert_eq!(p.delay_for(1, None), Duration::from_millis(100));
        assert_eq!(p.delay_for(2, None), Duration::from_millis(200));
        assert_eq!(p.delay_for(3, None), Duration::from_millis(400));
        assert_eq!(p.delay_for(10, None), Duration::from_secs(2));
        assert_eq!(
            p.delay_for(1, Some(Duration::from_secs(1))),
            Duration::from_secs(1)
        );
        assert_eq!(
            p.delay_for(1, Some(Duration::from_secs(60))),
            Duration::from_secs(2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_retries_then_succeeds() {
        let sink = Arc::new(RecordingSink::default());
        let translator = ErrorTranslator::new(policy(), sink.clone());
        let calls = AtomicU32::new(0);

        let result = translator
            .call(&Operation::write("update"), || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendFailure::Http {
                        status: 429,
                        code: None,
                        message: "slow down".into(),
                        retry_after: Some(Duration::from_millis(750)),
                    })
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            DiagnosticEvent::Retry { kind: ErrorKind::RateLimit, delay, .. } if delay == Duration::from_millis(750)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_surfaces_after_max_attempts() {
        let translator = ErrorTranslator::new(policy(), Arc::new(TracingSink));
        let calls = AtomicU32::new(0);
        let err = translator
            .call(&Operation::read("search"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(BackendFailure::fault("EXCEEDED_REQUEST_LIMIT", "limit"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn faults_retry_only_for_idempotent_reads() {
        let translator = ErrorTranslator::new(policy(), Arc::new(TracingSink));

        let reads = AtomicU32::new(0);
        let err = translator
            .call(&Operation::read("fetch_fields"), || async {
                reads.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(BackendFailure::fault("UNEXPECTED_ERROR", "boom"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendFault);
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        let writes = AtomicU32::new(0);
        translator
            .call(&Operation::write("update"), || async {
                writes.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(BackendFailure::fault("UNEXPECTED_ERROR", "boom"))
            })
            .await
            .unwrap_err();
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_error_is_never_retried() {
        let translator = ErrorTranslator::new(policy(), Arc::new(TracingSink));
        let calls = AtomicU32::new(0);
        let err = translator
            .call(&Operation::read("search"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(BackendFailure::fault("INSUFFICIENT_PERMISSION", "role lacks access"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_becomes_timeout_error() {
        let translator = ErrorTranslator::new(RetryPolicy::none(), Arc::new(TracingSink));
        let op = Operation::read("search").timeout(Duration::from_secs(5));
        let err = translator
            .call(&op, || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, BackendFailure>(())
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SuitebridgeError::Timeout {
                operation: "search".into(),
                timeout: Duration::from_secs(5)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    #[tracing_test::traced_test]
    async fn final_failure_is_logged() {
        let translator = ErrorTranslator::new(RetryPolicy::none(), Arc::new(TracingSink));
        let _ = translator
            .call(&Operation::read("search"), || async {
                Err::<(), _>(BackendFailure::fault("RCRD_DSNT_EXIST", "missing"))
            })
            .await;
        assert!(logs_contain("backend call failed"));
        assert!(logs_contain("record_not_found"));
    }
}
