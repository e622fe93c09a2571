// ── Retry budget ──
//
// Counts consecutive failed attempts and produces the delay before the
// next one. Owned by the connection manager and reset whenever a
// connection reaches `open`.

use std::time::Duration;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after this delay.
    RetryAfter(Duration),
    /// The budget is spent; fall back to the synthesizer.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct RetryBudget {
    failures: u32,
    max_retries: u32,
    base: Duration,
    max: Duration,
    current_delay: Duration,
}

impl RetryBudget {
    pub fn new(max_retries: u32, base: Duration, max: Duration) -> Self {
        Self {
            failures: 0,
            max_retries,
            base,
            max,
            current_delay: base,
        }
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.current_delay = self.base;
    }

    /// Count one failed attempt and decide what happens next.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.failures = self.failures.saturating_add(1);
        if self.is_exhausted() {
            return RetryDecision::Exhausted;
        }
        self.current_delay = calculate_backoff(self.failures, self.base, self.max);
        RetryDecision::RetryAfter(self.current_delay)
    }

    pub fn is_exhausted(&self) -> bool {
        self.failures >= self.max_retries
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with deterministic jitter, capped at `max`.
///
/// `delay = min(base * 2^(failures-1) * jitter, max)`
///
/// Jitter is +-25%, seeded from the failure count so multiple clients
/// spread out without any shared randomness.
pub fn calculate_backoff(failures: u32, base: Duration, max: Duration) -> Duration {
    let exponent = i32::try_from(failures.saturating_sub(1)).unwrap_or(i32::MAX);
    let raw = base.as_secs_f64() * 2.0_f64.powi(exponent);

    let jitter_factor = 1.0 + 0.25 * (f64::from(failures) * 7.3).sin();
    // NaN (zero base times an infinite exponent) collapses to zero here.
    let with_jitter = (raw * jitter_factor).max(0.0).min(max.as_secs_f64());

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
