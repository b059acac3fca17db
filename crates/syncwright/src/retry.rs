//! Retry utilities for outbound provider calls.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::error::SyncError;
use crate::reconcile::types::{ProgressCallback, ReconcileProgress, emit};

/// Initial backoff between attempts.
pub const INITIAL_BACKOFF_MS: u64 = 1000;
/// Upper bound on a single backoff.
pub const MAX_BACKOFF_MS: u64 = 60_000;
/// Attempts after the first before giving up.
pub const MAX_RETRIES: usize = 5;

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Run `operation`, retrying while the error is transient.
///
/// A provider-supplied `Retry-After` is not honoured exactly; the backoff
/// grows regardless and the rate limiter smooths the next attempts.
pub async fn with_retry<T, F, Fut>(
    mut operation: F,
    config: RetryConfig,
    label: &str,
    on_progress: Option<&ProgressCallback>,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(config.into_backoff())
        .notify(|err, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            emit(
                on_progress,
                ReconcileProgress::Backoff {
                    query: label.to_string(),
                    retry_after_ms: dur.as_millis() as u64,
                    attempt: current_attempt,
                },
            );
            tracing::debug!(
                query = label,
                attempt = current_attempt,
                delay_ms = dur.as_millis() as u64,
                error = %err,
                "retrying after transient failure"
            );
        })
        .when(SyncError::is_retryable)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.min_delay, Duration::from_millis(INITIAL_BACKOFF_MS));
        assert_eq!(config.max_delay, Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(config.max_retries, MAX_RETRIES);
        assert!(config.with_jitter);
        assert!(!config.with_jitter(false).with_jitter);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_and_emits_progress() {
        let calls = Arc::new(AtomicU32::new(0));
        let events: Arc<Mutex<Vec<ReconcileProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let events_capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            events_capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });

        let calls_capture = Arc::clone(&calls);
        let operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                let n = calls_capture.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(SyncError::UpstreamStatus {
                        status: 502,
                        body: String::new(),
                    })
                } else {
                    Ok(42u32)
                }
            }
        };

        let result = with_retry(operation, RetryConfig::default(), "Labels", Some(&callback)).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ReconcileProgress::Backoff { .. }))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_capture = Arc::clone(&calls);
        let operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                calls_capture.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(SyncError::GraphQl {
                    query: "Labels".into(),
                    messages: vec!["bad field".into()],
                })
            }
        };

        let err = with_retry(operation, RetryConfig::default(), "Labels", None)
            .await
            .expect_err("expected error");
        assert!(matches!(err, SyncError::GraphQl { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
