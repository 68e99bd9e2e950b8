//! Wires the pipeline from configuration.
//!
//! Storage, transport replies and the clock are supplied by the host
//! application as [`Collaborators`]; everything else is built from
//! [`SchedulrConfig`].

use std::sync::Arc;
use std::time::Duration;

use schedulr_common::time::Clock;
use schedulr_core::{
    retry_config, AggregationBuffer, CalendarScheduler, EventExtractor, ExtractionOrchestrator,
    LinkedAccountRepository, PipelineCoordinator, PipelineSink, ReplySink, TimeZoneResolver,
    TimezoneLookup, UserProfileRepository,
};
use schedulr_domain::{Result, SchedulrConfig};
use tracing::info;

use crate::http::HttpClient;
use crate::integrations::{
    AccountLinker, ChatCompletionsExtractor, GoogleCalendarProvider, GoogleOAuthClient,
    GoogleTimezoneLookup,
};

/// Host-provided ports.
#[derive(Clone)]
pub struct Collaborators {
    pub profiles: Arc<dyn UserProfileRepository>,
    pub accounts: Arc<dyn LinkedAccountRepository>,
    pub replies: Arc<dyn ReplySink>,
    pub clock: Arc<dyn Clock>,
}

/// Assembled pipeline.
pub struct Pipeline {
    /// Entry point for inbound fragments.
    pub buffer: AggregationBuffer,
    pub coordinator: Arc<PipelineCoordinator>,
    /// Present when Google OAuth is configured.
    pub linker: Option<Arc<AccountLinker>>,
}

/// Build buffer, orchestrator, scheduler, resolver and coordinator.
///
/// Extraction providers are ordered by `extraction.priority`; names without
/// a configured provider are skipped with a warning.
///
/// # Errors
/// Returns `Config` for an invalid configuration, or an error if an HTTP
/// client cannot be constructed.
pub fn build_pipeline(config: &SchedulrConfig, collaborators: Collaborators) -> Result<Pipeline> {
    config.validate()?;
    let Collaborators { profiles, accounts, replies, clock } = collaborators;

    let orchestrator = ExtractionOrchestrator::with_priority(
        available_extractors(config)?,
        &config.extraction.priority,
        retry_config(&config.extraction.retry),
    );

    let mut scheduler = CalendarScheduler::new(
        Arc::clone(&accounts),
        Arc::clone(&clock),
        retry_config(&config.calendar.retry),
    );
    let mut linker = None;
    if let Some(google) = &config.calendar.google {
        let oauth = GoogleOAuthClient::new(google, Arc::clone(&clock))?;
        let provider = GoogleCalendarProvider::new(HttpClient::new()?, oauth.clone());
        scheduler = scheduler.with_provider(Arc::new(provider));
        linker = Some(Arc::new(AccountLinker::new(
            oauth,
            Arc::clone(&accounts),
            Duration::from_secs(google.link_state_ttl_secs),
        )));
    }

    let lookup = match &config.timezone.google_api_key {
        Some(key) => Some(
            Arc::new(GoogleTimezoneLookup::new(key.clone(), Arc::clone(&clock))?)
                as Arc<dyn TimezoneLookup>,
        ),
        None => None,
    };
    let resolver = TimeZoneResolver::new(&config.timezone.default_timezone, lookup);

    info!(
        providers = ?orchestrator.provider_names(),
        google_calendar = linker.is_some(),
        default_timezone = %resolver.default_zone(),
        "pipeline assembled"
    );

    let coordinator =
        Arc::new(PipelineCoordinator::new(profiles, resolver, orchestrator, scheduler, clock));
    let sink = PipelineSink::new(Arc::clone(&coordinator), replies);
    let buffer = AggregationBuffer::new(config.aggregation.quiet_period(), Arc::new(sink));

    Ok(Pipeline { buffer, coordinator, linker })
}

fn available_extractors(config: &SchedulrConfig) -> Result<Vec<Arc<dyn EventExtractor>>> {
    let mut available: Vec<Arc<dyn EventExtractor>> = Vec::new();
    if let Some(openai) = &config.extraction.openai {
        available.push(Arc::new(ChatCompletionsExtractor::openai(openai)?));
    }
    if let Some(deepseek) = &config.extraction.deepseek {
        available.push(Arc::new(ChatCompletionsExtractor::deepseek(deepseek)?));
    }
    Ok(available)
}
