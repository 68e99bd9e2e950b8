//! Port interfaces for natural-language event extraction

use async_trait::async_trait;
use schedulr_domain::{ApiError, EventCandidate, ExtractionRequest};

/// Raw output of one extraction provider call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderExtraction {
    pub events: Vec<EventCandidate>,
    pub explanation: Option<String>,
}

/// A provider that turns narrative text into event candidates.
///
/// Implementations classify every failure: transient ones (throttling,
/// 5xx, timeouts) set `ApiError::retryable`; malformed output and auth
/// failures do not.
#[async_trait]
pub trait EventExtractor: Send + Sync {
    /// Stable lowercase name used in priority configuration and logs.
    fn name(&self) -> &str;

    async fn extract(&self, request: &ExtractionRequest) -> Result<ProviderExtraction, ApiError>;
}
