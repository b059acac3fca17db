//! What to tell the broker once a message was handled.

use std::time::Duration;

use crate::error::{HandlerFailure, SyncError};

/// First nak delay; doubles with every delivery.
pub const BASE_NAK_DELAY: Duration = Duration::from_secs(1);
pub const MAX_NAK_DELAY: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Handled; acknowledge.
    Ack,
    /// Will never succeed; acknowledge and log.
    Drop { reason: String },
    /// Redeliver after `delay`.
    Nak { delay: Duration },
}

impl Disposition {
    /// Classify a handler outcome for the `delivered`-th delivery.
    pub fn from_result(result: &Result<(), HandlerFailure>, delivered: u32) -> Self {
        match result {
            Ok(()) => Self::Ack,
            Err(failure) if failure.retryable => {
                let backoff = nak_delay(delivered);
                let delay = match &failure.error {
                    SyncError::RateLimited {
                        retry_after: Some(retry_after),
                    } => backoff.max(*retry_after),
                    _ => backoff,
                };
                Self::Nak { delay }
            }
            Err(failure) => Self::Drop {
                reason: failure.error.to_string(),
            },
        }
    }

    pub fn is_ack(&self) -> bool {
        !matches!(self, Self::Nak { .. })
    }
}

/// Exponential redelivery delay for the `delivered`-th attempt (1-based).
pub fn nak_delay(delivered: u32) -> Duration {
    let exponent = delivered.saturating_sub(1).min(16);
    BASE_NAK_DELAY
        .saturating_mul(1u32 << exponent)
        .min(MAX_NAK_DELAY)
}
