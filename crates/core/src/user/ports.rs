//! Port interfaces for user profile management
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations for user profile operations.

use async_trait::async_trait;
use schedulr_domain::{ConversationId, Result, UserProfile};

/// Trait for user profile persistence and retrieval
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Get the profile of the user owning a conversation
    async fn get_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<UserProfile>>;

    /// Create or update a user profile
    async fn save(&self, profile: &UserProfile) -> Result<()>;
}
