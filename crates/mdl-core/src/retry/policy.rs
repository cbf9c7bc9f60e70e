use std::time::Duration;

use rand::Rng;

/// Backoff base used when none is configured.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

const JITTER_MIN: f64 = 0.8;
const JITTER_MAX: f64 = 1.2;

/// High-level classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out.
    Timeout,
    /// Network-level failure (connection reset).
    Connection,
    /// Temporary DNS resolution failure.
    Dns,
    /// Retryable server-side HTTP status (5xx).
    Http5xx(u16),
    /// Any other error (not retried).
    Other,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Other)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; the job reaches its terminal state.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Source of the multiplicative jitter applied to each backoff delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Uniform in `[0.8, 1.2)`.
    Uniform,
    /// Always the given factor. Values outside `[0.8, 1.2]` are clamped.
    Fixed(f64),
}

impl Jitter {
    pub fn sample(self) -> f64 {
        match self {
            Jitter::Uniform => rand::thread_rng().gen_range(JITTER_MIN..JITTER_MAX),
            Jitter::Fixed(f) if f.is_finite() => f.clamp(JITTER_MIN, JITTER_MAX),
            Jitter::Fixed(_) => 1.0,
        }
    }
}

/// `round(base * 2^(attempt-1) * jitter)`; `attempt` is 1-based.
pub fn backoff_delay(base: Duration, attempt: u32, jitter: f64) -> Duration {
    let exp = attempt.saturating_sub(1).min(62) as i32;
    let millis = base.as_millis() as f64 * 2f64.powi(exp) * jitter;
    Duration::from_millis(millis.round() as u64)
}

/// Exponential backoff policy with jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first): retries + 1.
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: DEFAULT_BASE_DELAY,
            jitter: Jitter::Uniform,
        }
    }
}

impl RetryPolicy {
    /// Policy allowing `retries` retries after the first attempt.
    pub fn with_retries(retries: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            base_delay,
            jitter: Jitter::Uniform,
        }
    }

    /// Decide what happens after `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, retryable: bool) -> RetryDecision {
        if !retryable || attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(backoff_delay(
            self.base_delay,
            attempt,
            self.jitter.sample(),
        ))
    }
}
