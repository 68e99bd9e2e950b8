//! Retry policy for classified provider failures.

use schedulr_common::resilience::{
    ExponentialBackoff, Jitter, RetryConfig, RetryDecision, RetryPolicy,
};
use schedulr_domain::{ApiError, RetrySettings};

/// Retries an [`ApiError`] only when the adapter flagged it as transient.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientApiErrors;

impl RetryPolicy<ApiError> for TransientApiErrors {
    fn should_retry(&self, error: &ApiError, _attempt: u32) -> RetryDecision {
        if error.retryable {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Exponential backoff with equal jitter, bounded by `settings.max_attempts`.
pub fn retry_config(settings: &RetrySettings) -> RetryConfig {
    RetryConfig {
        max_attempts: settings.max_attempts.max(1),
        backoff: ExponentialBackoff {
            initial_delay: settings.initial_backoff(),
            base: settings.backoff_base,
            max_delay: settings.max_backoff(),
        },
        jitter: Jitter::Equal,
    }
}
