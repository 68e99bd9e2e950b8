//! Extraction orchestrator - consults providers in priority order

use std::sync::Arc;

use schedulr_common::resilience::{RetryConfig, RetryError, RetryExecutor};
use schedulr_domain::{
    ApiError, EventCandidate, Extraction, ExtractionRequest, Result, SchedulrError,
};
use tracing::{debug, info, instrument, warn};

use super::ports::EventExtractor;
use crate::retry::TransientApiErrors;

/// Tries each provider in turn until one yields a non-empty, parsed result.
///
/// Every provider gets its own bounded retry sequence. Retryable failures are
/// retried with backoff; permanent failures and exhausted retries move on to
/// the next provider. Raw provider errors never leave this type; callers see
/// a single [`SchedulrError::ExtractionExhausted`].
pub struct ExtractionOrchestrator {
    providers: Vec<Arc<dyn EventExtractor>>,
    executor: RetryExecutor<TransientApiErrors>,
}

impl ExtractionOrchestrator {
    /// Providers are consulted in the order given.
    pub fn new(providers: Vec<Arc<dyn EventExtractor>>, retry: RetryConfig) -> Self {
        Self { providers, executor: RetryExecutor::new(retry, TransientApiErrors) }
    }

    /// Order `available` providers by the configured `priority` names.
    ///
    /// Names are matched case-insensitively. Unknown names are skipped with a
    /// warning and providers not named in `priority` are left out.
    pub fn with_priority(
        available: Vec<Arc<dyn EventExtractor>>,
        priority: &[String],
        retry: RetryConfig,
    ) -> Self {
        let mut ordered: Vec<Arc<dyn EventExtractor>> = Vec::with_capacity(priority.len());
        for name in priority {
            let wanted = name.trim();
            let Some(provider) = available.iter().find(|p| p.name().eq_ignore_ascii_case(wanted))
            else {
                warn!(provider = %wanted, "configured extraction provider is not available");
                continue;
            };
            if ordered.iter().any(|p| p.name() == provider.name()) {
                debug!(provider = %wanted, "duplicate provider in priority list");
                continue;
            }
            ordered.push(Arc::clone(provider));
        }
        Self::new(ordered, retry)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Extract event candidates from the request narrative.
    ///
    /// # Errors
    /// `SchedulrError::ExtractionExhausted` when no provider produced at least
    /// one usable event.
    #[instrument(skip(self, request), fields(providers = self.providers.len()))]
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction> {
        for provider in &self.providers {
            let name = provider.name();
            let extractor: &dyn EventExtractor = provider.as_ref();

            let outcome = self.executor.execute_with_outcome(move || extractor.extract(request)).await;

            match outcome.result {
                Ok(output) => {
                    let events = usable_events(output.events);
                    if events.is_empty() {
                        info!(provider = name, attempts = outcome.attempts, "provider found no events, trying next");
                        continue;
                    }
                    info!(
                        provider = name,
                        attempts = outcome.attempts,
                        events = events.len(),
                        "extraction succeeded"
                    );
                    return Ok(Extraction {
                        events,
                        explanation: output.explanation,
                        provider: name.to_string(),
                    });
                }
                Err(err) => log_provider_failure(name, outcome.attempts, &err),
            }
        }

        Err(SchedulrError::ExtractionExhausted(format!(
            "no events extracted by {} provider(s)",
            self.providers.len()
        )))
    }
}

fn usable_events(events: Vec<EventCandidate>) -> Vec<EventCandidate> {
    events
        .into_iter()
        .filter(|event| {
            let keep = !event.title.trim().is_empty();
            if !keep {
                debug!("dropping event candidate without a title");
            }
            keep
        })
        .collect()
}

fn log_provider_failure(provider: &str, attempts: u32, err: &RetryError<ApiError>) {
    match err {
        RetryError::AttemptsExhausted { last_error, .. } => {
            warn!(provider, attempts, error = %last_error, "provider retries exhausted, falling back");
        }
        RetryError::NonRetryable { source } => {
            warn!(provider, attempts, error = %source, "provider failed permanently, falling back");
        }
        other => warn!(provider, attempts, error = %other, "provider failed, falling back"),
    }
}
