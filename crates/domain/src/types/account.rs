//! Linked calendar credentials.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::CalendarFlavor;
use super::user::UserId;

/// OAuth credential binding a user to an external calendar provider.
///
/// Updated in place whenever the access token is refreshed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub user_id: UserId,
    pub provider: CalendarFlavor,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, always UTC.
    pub expiry: DateTime<Utc>,
}

impl LinkedAccount {
    /// Expired once `now` reaches the stored expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    /// Apply a refresh response. A provider that does not rotate the refresh
    /// token leaves the stored one in place.
    pub fn apply_refresh(&mut self, refreshed: RefreshedToken) {
        self.access_token = refreshed.access_token;
        if let Some(refresh_token) = refreshed.refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = refresh_token;
        }
        self.expiry = refreshed.expiry;
    }
}

impl fmt::Debug for LinkedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedAccount")
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Token material returned by a successful refresh or code exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

impl fmt::Debug for RefreshedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshedToken")
            .field("access_token", &"<redacted>")
            .field("rotated", &self.refresh_token.is_some())
            .field("expiry", &self.expiry)
            .finish()
    }
}
