//! Backoff policy: decides how long a failed task waits before its next try.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Backoff policy for failed tasks.
///
/// `delay(n) = base_delay * multiplier(n)`, where `n` is the number of
/// attempts already made (1-indexed). Attempt 0 always yields a zero delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffPolicy {
    /// fib(n) × 20s. One-time verification codes.
    Fibonacci,

    /// (2^(n-1) + jitter in [0, 3)) × 10s. Notification delivery.
    ExponentialJitter,

    /// n × 20s. Everything else.
    Linear,
}

/// Upper bound (exclusive) of the integer jitter added by `ExponentialJitter`.
pub const JITTER_SPAN: u64 = 3;

impl BackoffPolicy {
    pub fn base_delay(self) -> Duration {
        match self {
            BackoffPolicy::ExponentialJitter => Duration::from_secs(10),
            BackoffPolicy::Fibonacci | BackoffPolicy::Linear => Duration::from_secs(20),
        }
    }

    /// The deterministic part of the multiplier (no jitter).
    pub fn floor_multiplier(self, attempt: u32) -> u64 {
        if attempt == 0 {
            return 0;
        }

        match self {
            BackoffPolicy::Fibonacci => fibonacci(attempt),
            // Capped so that absurd attempt counts saturate instead of overflowing.
            BackoffPolicy::ExponentialJitter => 1u64 << (attempt - 1).min(62),
            BackoffPolicy::Linear => u64::from(attempt),
        }
    }

    pub fn multiplier<R: Rng + ?Sized>(self, attempt: u32, rng: &mut R) -> u64 {
        let floor = self.floor_multiplier(attempt);
        match self {
            BackoffPolicy::ExponentialJitter if attempt > 0 => {
                floor.saturating_add(rng.gen_range(0..JITTER_SPAN))
            }
            _ => floor,
        }
    }

    pub fn delay<R: Rng + ?Sized>(self, attempt: u32, rng: &mut R) -> Duration {
        let multiplier = u32::try_from(self.multiplier(attempt, rng)).unwrap_or(u32::MAX);
        self.base_delay().saturating_mul(multiplier)
    }
}

/// fib(0) = 0, fib(1) = 1, saturating at `u64::MAX`.
fn fibonacci(n: u32) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}
