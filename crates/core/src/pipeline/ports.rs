//! Port interface for delivering pipeline results back to the transport

use async_trait::async_trait;
use schedulr_domain::{ConversationId, ScheduledEvent, SchedulrError};

/// Renders pipeline results in the originating conversation.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn on_scheduled(&self, conversation_id: &ConversationId, events: &[ScheduledEvent]);

    async fn on_failure(&self, conversation_id: &ConversationId, error: &SchedulrError);
}
