//! Port interfaces for calendar providers and linked-account storage
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations for calendar operations.

use async_trait::async_trait;
use schedulr_domain::{
    ApiError, CalendarFlavor, EventCandidate, LinkedAccount, RefreshedToken, Result, UserId,
};

/// A calendar service that can refresh credentials and insert events.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Calendar product served by this provider
    fn flavor(&self) -> CalendarFlavor;

    /// Exchange a refresh token for a fresh access token
    async fn refresh_token(&self, refresh_token: &str) -> std::result::Result<RefreshedToken, ApiError>;

    /// Insert an event and return a link to it
    async fn insert_event(
        &self,
        access_token: &str,
        event: &EventCandidate,
    ) -> std::result::Result<String, ApiError>;
}

/// Trait for linked calendar account persistence
#[async_trait]
pub trait LinkedAccountRepository: Send + Sync {
    async fn get_linked_account(
        &self,
        user_id: UserId,
        provider: CalendarFlavor,
    ) -> Result<Option<LinkedAccount>>;

    /// Insert or replace the account for `(user_id, provider)`
    async fn save_linked_account(&self, account: &LinkedAccount) -> Result<()>;

    async fn delete_linked_account(&self, user_id: UserId, provider: CalendarFlavor) -> Result<()>;
}
