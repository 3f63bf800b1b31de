//! Bounded polling with a pluggable delay function.
//!
//! A `RetryPolicy` is applied to any "poll until found" operation. The
//! operation reports `Ok(None)` when the thing it waits for is not there yet;
//! only that outcome is retried. Errors end the poll immediately.

use std::thread;
use std::time::Duration;

use tracing::debug;

/// Delay applied after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same pause after every attempt.
    Fixed(Duration),
    /// `base * attempt / 3`, growing linearly with the 1-based attempt index.
    Linear(Duration),
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear(base) => base * attempt / 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, Backoff::Fixed(delay))
    }

    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        Self::new(max_attempts, Backoff::Linear(base))
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Run `op` until it yields a value or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. Returns `Ok(None)` when every
    /// attempt came back empty; the caller decides how to report that.
    pub fn poll<T, E, F>(&self, mut op: F) -> Result<Option<T>, E>
    where
        F: FnMut(u32) -> Result<Option<T>, E>,
    {
        for attempt in 1..=self.max_attempts {
            if let Some(found) = op(attempt)? {
                return Ok(Some(found));
            }
            if attempt < self.max_attempts {
                let delay = self.backoff.delay(attempt);
                debug!(attempt, max_attempts = self.max_attempts, ?delay, "nothing yet, retrying");
                thread::sleep(delay);
            }
        }
        Ok(None)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(10, Duration::from_secs(1))
    }
}
