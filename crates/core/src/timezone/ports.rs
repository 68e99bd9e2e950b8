//! Port interface for coordinate-based timezone lookup

use async_trait::async_trait;
use schedulr_domain::{GeoPoint, Result};

/// Maps coordinates to an IANA timezone name.
#[async_trait]
pub trait TimezoneLookup: Send + Sync {
    async fn timezone_at(&self, point: GeoPoint) -> Result<String>;
}
