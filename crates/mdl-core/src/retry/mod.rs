//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (timeouts, connection
//! resets, DNS hiccups, 5xx responses) and the jittered exponential backoff
//! used by the worker pool, so every strategy shares one policy.

mod classify;
mod policy;

pub use classify::{classify_http_status, classify_message};
pub use policy::{backoff_delay, ErrorKind, Jitter, RetryDecision, RetryPolicy, DEFAULT_BASE_DELAY};
