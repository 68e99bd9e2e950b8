//! Pipeline coordinator - core business logic for one flushed conversation

use std::sync::Arc;

use chrono_tz::Tz;
use schedulr_common::time::Clock;
use schedulr_domain::{
    ConversationId, ExtractionRequest, GeoPoint, RawMessageFragment, Result, ScheduledEvent,
    SchedulrError, UserProfile,
};
use tracing::{debug, info, instrument};

use crate::aggregation::build_narrative;
use crate::extraction::ExtractionOrchestrator;
use crate::scheduling::CalendarScheduler;
use crate::timezone::TimeZoneResolver;
use crate::user::ports::UserProfileRepository;

/// Pipeline coordinator
pub struct PipelineCoordinator {
    profiles: Arc<dyn UserProfileRepository>,
    resolver: TimeZoneResolver,
    orchestrator: ExtractionOrchestrator,
    scheduler: CalendarScheduler,
    clock: Arc<dyn Clock>,
}

impl PipelineCoordinator {
    pub fn new(
        profiles: Arc<dyn UserProfileRepository>,
        resolver: TimeZoneResolver,
        orchestrator: ExtractionOrchestrator,
        scheduler: CalendarScheduler,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { profiles, resolver, orchestrator, scheduler, clock }
    }

    pub fn orchestrator(&self) -> &ExtractionOrchestrator {
        &self.orchestrator
    }

    pub fn scheduler(&self) -> &CalendarScheduler {
        &self.scheduler
    }

    /// Run extraction and scheduling for a drained batch.
    ///
    /// An empty batch returns an empty list without touching any
    /// collaborator.
    ///
    /// # Errors
    /// `NotFound` when no profile owns the conversation, `ExtractionExhausted`
    /// when no provider produced events, or a storage error from the
    /// repositories.
    #[instrument(skip(self, fragments), fields(conversation_id = %conversation_id, fragments = fragments.len()))]
    pub async fn process(
        &self,
        conversation_id: &ConversationId,
        fragments: Vec<RawMessageFragment>,
    ) -> Result<Vec<ScheduledEvent>> {
        if fragments.is_empty() {
            debug!("empty batch, nothing to do");
            return Ok(Vec::new());
        }

        let profile = self.profile_for(conversation_id).await?;
        let timezone = self.resolver.resolve(&profile).await;

        let request = ExtractionRequest {
            reference_time: self.clock.now_utc().with_timezone(&timezone),
            calendar: profile.preferred_calendar,
            narrative: build_narrative(&fragments),
        };

        let extraction = self.orchestrator.extract(&request).await?;
        info!(
            user_id = %profile.id,
            provider = %extraction.provider,
            events = extraction.events.len(),
            timezone = %timezone,
            "events extracted"
        );

        Ok(self.scheduler.schedule(profile.id, profile.preferred_calendar, extraction.events).await)
    }

    /// Store the timezone found at `point` on the conversation owner's profile.
    #[instrument(skip(self, point), fields(conversation_id = %conversation_id))]
    pub async fn update_location(
        &self,
        conversation_id: &ConversationId,
        point: GeoPoint,
    ) -> Result<Tz> {
        let mut profile = self.profile_for(conversation_id).await?;
        let timezone = self.resolver.timezone_for_location(point).await?;

        profile.location = Some(point);
        profile.timezone = Some(timezone.name().to_string());
        self.profiles.save(&profile).await?;

        info!(user_id = %profile.id, timezone = %timezone, "profile timezone updated");
        Ok(timezone)
    }

    async fn profile_for(&self, conversation_id: &ConversationId) -> Result<UserProfile> {
        self.profiles.get_by_conversation(conversation_id).await?.ok_or_else(|| {
            SchedulrError::NotFound(format!("no user profile for conversation {conversation_id}"))
        })
    }
}
