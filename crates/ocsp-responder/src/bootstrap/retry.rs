//! Cancellable retry loop
//!
//! An operation is attempted immediately, then again after each backoff
//! delay until it succeeds or the cancellation token fires. Attempts are
//! strictly sequential and nothing stays scheduled after success.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Delay policy between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failure
    Fixed(Duration),
    /// Doubling delay, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// No delay between attempts
    pub const fn immediate() -> Self {
        Self::Fixed(Duration::ZERO)
    }

    /// Delay before attempt `failures + 1`, after `failures` failed attempts
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let exponent = failures.saturating_sub(1).min(31);
                initial.saturating_mul(1u32 << exponent).min(max)
            }
        }
    }
}

/// The token fired before the operation succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("retry loop cancelled after {attempts} attempts")]
pub struct Cancelled {
    pub attempts: u32,
}

/// Run `op` until it succeeds, sleeping per `backoff` after each failure.
///
/// Returns the value and the number of attempts it took.
pub async fn retry<T, E, F, Fut>(
    job: &str,
    backoff: Backoff,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<(T, u32), Cancelled>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempts = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(Cancelled { attempts });
        }

        attempts += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled { attempts }),
            outcome = op() => outcome,
        };

        match outcome {
            Ok(value) => {
                if attempts > 1 {
                    info!(job, attempts, "Retry job succeeded, removing it");
                }
                return Ok((value, attempts));
            }
            Err(e) => {
                let delay = backoff.delay(attempts);
                warn!(
                    job,
                    attempt = attempts,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Attempt failed, scheduling retry"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Cancelled { attempts }),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
