//! Generic retry executor with bounded attempts, backoff and jitter
//!
//! The executor consults a [`RetryPolicy`] after every failure. A policy
//! `Stop` ends the sequence immediately with [`RetryError::NonRetryable`];
//! otherwise the operation is attempted again until `max_attempts` is reached,
//! at which point [`RetryError::AttemptsExhausted`] carries the last error.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during retry operations
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every permitted attempt failed with a retryable error
    #[error("All retry attempts exhausted after {attempts} tries: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: E },

    /// The operation failed with a non-retryable error
    #[error("Operation failed with non-retryable error: {source}")]
    NonRetryable { source: E },

    /// The retry configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl<E> RetryError<E> {
    /// The underlying operation error, if one was observed.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::AttemptsExhausted { last_error, .. } => Some(last_error),
            Self::NonRetryable { source } => Some(source),
            Self::InvalidConfiguration { .. } => None,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Outcome of a retry execution including the number of attempts made.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub attempts: u32,
    pub total_delay: Duration,
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// `attempt` is the 1-based number of the attempt that just failed.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation with the configured backoff delay
    Retry,
    /// Don't retry the operation
    Stop,
}

/// Exponential backoff: `initial_delay * base^retry`, capped at `max_delay`
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_delay: Duration,
    pub base: f64,
    pub max_delay: Duration,
}

impl ExponentialBackoff {
    /// Delay before retry number `retry` (0-based).
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay = self.initial_delay.as_millis() as f64 * self.base.powi(exponent);
        let delay_ms = delay.min(self.max_delay.as_millis() as f64).max(0.0) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Equal => {
                let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                let half = millis / 2;
                Duration::from_millis(half + random_up_to(millis - half))
            }
        }
    }
}

fn random_up_to(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max)
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    pub backoff: ExponentialBackoff,
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: ExponentialBackoff {
                initial_delay: Duration::from_millis(500),
                base: 2.0,
                max_delay: Duration::from_secs(10),
            },
            jitter: Jitter::Equal,
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetryError<()>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }
        if self.backoff.base <= 0.0 {
            return Err(RetryError::InvalidConfiguration {
                message: "exponential base must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        base: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = ExponentialBackoff { initial_delay, base, max_delay };
        self
    }

    pub fn no_jitter(mut self) -> Self {
        self.config.jitter = Jitter::None;
        self
    }

    pub fn equal_jitter(mut self) -> Self {
        self.config.jitter = Jitter::Equal;
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryError<()>> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Execute an operation with retry logic and report how many attempts
    /// were made.
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut total_delay = Duration::ZERO;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, "executing operation");

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retry");
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt, total_delay };
                }
                Err(error) => error,
            };

            if self.policy.should_retry(&error, attempt) == RetryDecision::Stop {
                debug!(attempt, error = %error, "retry policy stopped the sequence");
                return RetryOutcome {
                    result: Err(RetryError::NonRetryable { source: error }),
                    attempts: attempt,
                    total_delay,
                };
            }

            if attempt >= max_attempts {
                warn!(attempts = attempt, error = %error, "all retry attempts exhausted");
                return RetryOutcome {
                    result: Err(RetryError::AttemptsExhausted { attempts: attempt, last_error: error }),
                    attempts: attempt,
                    total_delay,
                };
            }

            let delay = self.config.jitter.apply(self.config.backoff.calculate_delay(attempt - 1));
            warn!(attempt, ?delay, error = %error, "operation failed, retrying");
            tokio::time::sleep(delay).await;
            total_delay += delay;
        }
    }
}
