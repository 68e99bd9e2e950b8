//! User profile types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::event::CalendarFlavor;

/// Stable user identifier (the transport's numeric user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic coordinates shared by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// User profile as stored by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    /// Explicit IANA timezone chosen by the user.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub preferred_calendar: CalendarFlavor,
}

impl UserProfile {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            username: None,
            timezone: None,
            location: None,
            preferred_calendar: CalendarFlavor::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(GeoPoint { latitude, longitude });
        self
    }
}
