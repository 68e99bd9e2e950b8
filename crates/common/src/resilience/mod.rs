//! Resilience patterns for fault tolerance
//!
//! Generic over the error type: callers supply a [`RetryPolicy`] that
//! classifies their own errors as transient or permanent. Domain-specific
//! policies live next to the services that use them.

pub mod retry;

pub use retry::{
    ExponentialBackoff, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
