//! Bounded retry with an explicit backoff policy.
//!
//! # Example
//!
//! ```
//! use build_server::publish::retry::{Backoff, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::immediate(3);
//! assert_eq!(policy.delay(2), Duration::ZERO);
//!
//! let policy = RetryPolicy {
//!     max_attempts: 5,
//!     backoff: Backoff::Exponential {
//!         base: Duration::from_secs(1),
//!         max: Duration::from_secs(4),
//!     },
//! };
//! assert_eq!(policy.delay(1), Duration::from_secs(1));
//! assert_eq!(policy.delay(3), Duration::from_secs(4));
//! assert_eq!(policy.delay(5), Duration::from_secs(4));
//! ```

use std::future::Future;
use std::time::Duration;

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry at once.
    Immediate,
    /// `base * attempt`.
    Linear(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`.
    Exponential {
        /// First delay.
        base: Duration,
        /// Upper bound.
        max: Duration,
    },
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// `max_attempts` attempts with no delay in between.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Immediate,
        }
    }

    /// Delay after failed attempt number `attempt` (1-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Immediate => Duration::ZERO,
            Backoff::Linear(base) => base.saturating_mul(attempt),
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

impl Default for RetryPolicy {
    /// Three immediate attempts.
    fn default() -> Self {
        Self::immediate(3)
    }
}

/// Every attempt failed.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryExhausted<E: std::fmt::Display> {
    /// Attempts made.
    pub attempts: u32,
    /// Error of the final attempt.
    pub last: E,
}

/// Runs `op` until it succeeds or the policy is used up.
///
/// `op` receives the 1-indexed attempt number. `on_retry` is called with the
/// failed attempt's number and error before each further attempt, but not
/// after the last one.
pub async fn retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    mut op: F,
    mut on_retry: R,
) -> Result<T, RetryExhausted<E>>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(u32, &E),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(last) if attempt >= max_attempts => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last,
                });
            }
            Err(e) => {
                on_retry(attempt, &e);
                let delay = policy.delay(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
