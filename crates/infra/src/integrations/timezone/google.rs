//! Google Time Zone API adapter

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use schedulr_common::time::Clock;
use schedulr_core::TimezoneLookup;
use schedulr_domain::{GeoPoint, Result, SchedulrError};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::HttpClient;

const GOOGLE_TIMEZONE_API_URL: &str = "https://maps.googleapis.com/maps/api/timezone/json";
const PROVIDER: &str = "google-timezone";

/// Resolves coordinates to an IANA zone via the Google Time Zone API.
pub struct GoogleTimezoneLookup {
    http_client: HttpClient,
    clock: Arc<dyn Clock>,
    api_key: String,
    api_url: String,
}

impl GoogleTimezoneLookup {
    pub fn new(api_key: impl Into<String>, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            http_client: HttpClient::new()?,
            clock,
            api_key: api_key.into(),
            api_url: GOOGLE_TIMEZONE_API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[async_trait]
impl TimezoneLookup for GoogleTimezoneLookup {
    async fn timezone_at(&self, point: GeoPoint) -> Result<String> {
        let location = format!("{},{}", point.latitude, point.longitude);
        let timestamp = self.clock.now_utc().timestamp().to_string();

        let builder = self.http_client.request(Method::GET, &self.api_url).query(&[
            ("location", location.as_str()),
            ("timestamp", timestamp.as_str()),
            ("key", self.api_key.as_str()),
        ]);

        let response = self
            .http_client
            .send(PROVIDER, builder)
            .await
            .map_err(|err| SchedulrError::Network(err.to_string()))?;

        let body: TimezoneResponse = response.json().await.map_err(|e| {
            SchedulrError::InvalidInput(format!("Failed to parse timezone response: {e}"))
        })?;

        match body {
            TimezoneResponse { status, time_zone_id: Some(zone), .. } if status == "OK" => {
                debug!(%location, zone = %zone, "timezone resolved");
                Ok(zone)
            }
            TimezoneResponse { status, error_message, .. } => {
                warn!(%location, %status, "timezone lookup rejected");
                let message = match error_message {
                    Some(detail) => format!("timezone lookup returned {status}: {detail}"),
                    None => format!("timezone lookup returned {status}"),
                };
                Err(SchedulrError::InvalidInput(message))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimezoneResponse {
    status: String,
    #[serde(default)]
    time_zone_id: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}
