//! Google Calendar provider implementation

use async_trait::async_trait;
use reqwest::Method;
use schedulr_core::CalendarProvider;
use schedulr_domain::{ApiError, CalendarFlavor, EventCandidate, EventTime, RefreshedToken};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::oauth::GoogleOAuthClient;
use crate::http::HttpClient;

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const PROVIDER: &str = "google-calendar";
const CALENDAR_ID: &str = "primary";
/// Wall-clock format sent alongside an explicit `timeZone`.
const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Google Calendar provider
pub struct GoogleCalendarProvider {
    http_client: HttpClient,
    oauth: GoogleOAuthClient,
    api_base: String,
}

impl GoogleCalendarProvider {
    pub fn new(http_client: HttpClient, oauth: GoogleOAuthClient) -> Self {
        Self { http_client, oauth, api_base: GOOGLE_CALENDAR_API_BASE.to_string() }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    fn flavor(&self) -> CalendarFlavor {
        CalendarFlavor::Google
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedToken, ApiError> {
        self.oauth.refresh(refresh_token).await
    }

    #[instrument(skip(self, access_token, event), fields(title = %event.title))]
    async fn insert_event(
        &self,
        access_token: &str,
        event: &EventCandidate,
    ) -> Result<String, ApiError> {
        let url = format!("{}/calendars/{}/events", self.api_base, CALENDAR_ID);
        let builder = self
            .http_client
            .request(Method::POST, &url)
            .bearer_auth(access_token)
            .json(&GoogleEvent::from(event));

        let response = self.http_client.send(PROVIDER, builder).await?;

        let created: CreatedEvent = response.json().await.map_err(|e| {
            ApiError::permanent(PROVIDER, format!("Failed to parse Google response: {e}"))
        })?;

        debug!(event_id = %created.id, "event created");
        Ok(created.html_link)
    }
}

#[derive(Debug, Serialize)]
struct GoogleEvent<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    start: EventDateTime<'a>,
    end: EventDateTime<'a>,
}

impl<'a> From<&'a EventCandidate> for GoogleEvent<'a> {
    fn from(event: &'a EventCandidate) -> Self {
        Self {
            summary: &event.title,
            description: event.description.as_deref(),
            location: event.location.as_deref(),
            start: EventDateTime::from(&event.start),
            end: EventDateTime::from(&event.end),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime<'a> {
    date_time: String,
    time_zone: &'a str,
}

impl<'a> From<&'a EventTime> for EventDateTime<'a> {
    fn from(time: &'a EventTime) -> Self {
        Self {
            date_time: time.date_time.format(LOCAL_DATE_TIME_FORMAT).to_string(),
            time_zone: &time.time_zone,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEvent {
    id: String,
    html_link: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use schedulr_common::time::MockClock;
    use schedulr_domain::{EventType, GoogleOAuthConfig};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(server: &MockServer) -> GoogleCalendarProvider {
        let config = GoogleOAuthConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_uri: "https://bot.example/cb".into(),
            link_state_ttl_secs: 600,
        };
        let clock = Arc::new(MockClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()));
        let oauth = GoogleOAuthClient::new(&config, clock)
            .unwrap()
            .with_token_endpoint(format!("{}/token", server.uri()));

        GoogleCalendarProvider::new(HttpClient::new().unwrap(), oauth).with_api_base(server.uri())
    }

    fn flight() -> EventCandidate {
        let day = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        EventCandidate::new(
            "Flight to NYC",
            EventTime::new(day.and_hms_opt(9, 0, 0).unwrap(), "Europe/Berlin"),
            Some(EventTime::new(day.and_hms_opt(11, 30, 0).unwrap(), "America/New_York")),
            EventType::Event,
        )
        .with_location("BER")
    }

    #[tokio::test]
    async fn inserts_local_wall_clock_with_zones_and_returns_html_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(header("Authorization", "Bearer access-token"))
            .and(body_json(serde_json::json!({
                "summary": "Flight to NYC",
                "location": "BER",
                "start": { "dateTime": "2024-06-02T09:00:00", "timeZone": "Europe/Berlin" },
                "end": { "dateTime": "2024-06-02T11:30:00", "timeZone": "America/New_York" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "evt-1",
                "htmlLink": "https://www.google.com/calendar/event?eid=evt-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let link = provider(&server).insert_event("access-token", &flight()).await.unwrap();

        assert_eq!(link, "https://www.google.com/calendar/event?eid=evt-1");
    }

    #[tokio::test]
    async fn throttled_insert_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rateLimitExceeded"))
            .mount(&server)
            .await;

        let err = provider(&server).insert_event("access-token", &flight()).await.unwrap_err();

        assert!(err.retryable);
        assert_eq!(err.status, Some(429));
    }

    #[tokio::test]
    async fn refresh_goes_through_the_token_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = provider(&server).refresh_token("refresh").await.unwrap();

        assert_eq!(token.access_token, "fresh");
        assert_eq!(token.expiry, Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
    }
}
