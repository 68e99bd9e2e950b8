//! Timezone resolution for user profiles

use std::sync::Arc;

use chrono_tz::Tz;
use schedulr_domain::{GeoPoint, Result, SchedulrError, UserProfile};
use tracing::{debug, warn};

use super::ports::TimezoneLookup;

/// Picks the effective timezone for a user.
///
/// Precedence: the profile's explicit zone, then a lookup of the profile's
/// coordinates, then the configured default, then UTC. Invalid names at any
/// step are logged and skipped.
pub struct TimeZoneResolver {
    default: Tz,
    lookup: Option<Arc<dyn TimezoneLookup>>,
}

impl TimeZoneResolver {
    pub fn new(default: &str, lookup: Option<Arc<dyn TimezoneLookup>>) -> Self {
        let default = parse_zone(default).unwrap_or_else(|| {
            warn!(timezone = default, "invalid default timezone, using UTC");
            Tz::UTC
        });
        Self { default, lookup }
    }

    pub fn default_zone(&self) -> Tz {
        self.default
    }

    pub async fn resolve(&self, profile: &UserProfile) -> Tz {
        if let Some(name) = profile.timezone.as_deref() {
            match parse_zone(name) {
                Some(tz) => return tz,
                None => warn!(user_id = %profile.id, timezone = name, "ignoring invalid profile timezone"),
            }
        }

        if let Some(point) = profile.location {
            match self.timezone_for_location(point).await {
                Ok(tz) => return tz,
                Err(err) => warn!(user_id = %profile.id, error = %err, "timezone lookup failed"),
            }
        }

        debug!(user_id = %profile.id, timezone = %self.default, "using default timezone");
        self.default
    }

    /// Resolve the IANA zone for shared coordinates.
    ///
    /// # Errors
    /// `Config` when no lookup is configured, `InvalidInput` when the lookup
    /// returns a name chrono-tz does not know, or whatever the lookup fails
    /// with.
    pub async fn timezone_for_location(&self, point: GeoPoint) -> Result<Tz> {
        let lookup = self
            .lookup
            .as_ref()
            .ok_or_else(|| SchedulrError::Config("no timezone lookup configured".into()))?;

        let name = lookup.timezone_at(point).await?;
        parse_zone(&name)
            .ok_or_else(|| SchedulrError::InvalidInput(format!("unknown timezone '{name}'")))
    }
}

fn parse_zone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    name.parse().ok()
}
