//! Conversions from external infrastructure errors into domain errors.
//!
//! `reqwest` embeds the request URL in its error text. Every conversion here
//! strips it first, since provider URLs may carry API keys in the query.

use reqwest::Error as HttpError;
use schedulr_domain::{ApiError, SchedulrError};
use thiserror::Error;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(pub SchedulrError);

impl From<InfraError> for SchedulrError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SchedulrError> for InfraError {
    fn from(value: SchedulrError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SchedulrError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let err = value.without_url();
        if err.is_timeout() || err.is_connect() {
            return InfraError(SchedulrError::Network(err.to_string()));
        }
        InfraError(SchedulrError::Internal(format!("HTTP client error: {err}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

/// Classify a transport-level failure for the retry loop.
///
/// Timeouts, connection failures and throttling/5xx statuses are transient;
/// everything else (including undecodable bodies) is permanent.
pub fn api_error_from_reqwest(provider: &str, err: HttpError) -> ApiError {
    let err = err.without_url();
    if let Some(status) = err.status() {
        return ApiError::from_status(provider, status.as_u16(), err.to_string());
    }
    if err.is_timeout() || err.is_connect() {
        return ApiError::retryable(provider, err.to_string());
    }
    ApiError::permanent(provider, err.to_string())
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
