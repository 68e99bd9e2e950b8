//! OpenAI-compatible chat completions client for event extraction
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use reqwest::Method;
use schedulr_core::{EventExtractor, ProviderExtraction};
use schedulr_domain::constants::{EVENT_TIMESTAMP_FORMAT, PROVIDER_DEEPSEEK, PROVIDER_OPENAI};
use schedulr_domain::{
    ApiError, EventCandidate, EventTime, EventType, ExtractionRequest, ProviderConfig, Result,
};
use tracing::{debug, info, warn};

use super::prompt::system_prompt;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, DateTimeSchema, EventSchema,
    EventsPayload, ResponseFormat,
};
use crate::http::HttpClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/chat/completions";
const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Extraction provider speaking the Chat Completions protocol.
///
/// One type serves every compatible vendor; [`openai`](Self::openai) and
/// [`deepseek`](Self::deepseek) fill in the vendor defaults.
pub struct ChatCompletionsExtractor {
    http_client: HttpClient,
    name: String,
    api_key: String,
    model: String,
    api_url: String,
}

impl ChatCompletionsExtractor {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_url: impl Into<String>,
        http_client: HttpClient,
    ) -> Self {
        Self {
            http_client,
            name: name.into(),
            api_key: api_key.into(),
            model: model.into(),
            api_url: api_url.into(),
        }
    }

    /// OpenAI preset (`gpt-4o-mini` unless configured otherwise)
    pub fn openai(config: &ProviderConfig) -> Result<Self> {
        Self::from_config(PROVIDER_OPENAI, OPENAI_DEFAULT_MODEL, OPENAI_API_URL, config)
    }

    /// DeepSeek preset (`deepseek-chat` unless configured otherwise)
    pub fn deepseek(config: &ProviderConfig) -> Result<Self> {
        Self::from_config(PROVIDER_DEEPSEEK, DEEPSEEK_DEFAULT_MODEL, DEEPSEEK_API_URL, config)
    }

    fn from_config(
        name: &str,
        default_model: &str,
        default_url: &str,
        config: &ProviderConfig,
    ) -> Result<Self> {
        let http_client =
            HttpClient::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self::new(
            name,
            config.api_key.clone(),
            config.model.clone().unwrap_or_else(|| default_model.to_string()),
            config.api_url.clone().unwrap_or_else(|| default_url.to_string()),
            http_client,
        ))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at another endpoint (self-hosted gateways, tests)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_api(&self, request: &ExtractionRequest) -> std::result::Result<String, ApiError> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(request)),
                ChatMessage::user(request.narrative.clone()),
            ],
            temperature: DEFAULT_TEMPERATURE,
            response_format: ResponseFormat::json_object(),
        };

        let builder = self
            .http_client
            .request(Method::POST, &self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload);

        let response = self.http_client.send(&self.name, builder).await?;

        let chat_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            ApiError::permanent(&self.name, format!("Failed to parse response: {e}"))
        })?;

        if let Some(usage) = &chat_response.usage {
            debug!(provider = %self.name, tokens = usage.total_tokens, "chat completion usage");
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ApiError::permanent(&self.name, "Response contained no content"))
    }
}

#[async_trait]
impl EventExtractor for ChatCompletionsExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> std::result::Result<ProviderExtraction, ApiError> {
        let content = self.call_api(request).await?;

        let payload: EventsPayload =
            serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
                warn!(provider = %self.name, error = %e, "model returned unparsable content");
                ApiError::permanent(&self.name, format!("Failed to parse events: {e}"))
            })?;

        let default_zone = request.timezone();
        let returned = payload.result.len();
        let events: Vec<EventCandidate> =
            payload.result.into_iter().filter_map(|schema| to_candidate(schema, default_zone)).collect();

        info!(
            provider = %self.name,
            returned,
            usable = events.len(),
            "chat completion extraction finished"
        );

        Ok(ProviderExtraction { events, explanation: payload.explanation })
    }
}

/// Remove a surrounding Markdown code fence (```json ... ```).
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Convert one model event into a candidate.
///
/// Events without a title or a parsable start are dropped. A missing or
/// unparsable end falls back to the type's default duration.
fn to_candidate(schema: EventSchema, default_zone: Tz) -> Option<EventCandidate> {
    let title = schema.title.trim();
    if title.is_empty() {
        debug!("dropping event without title");
        return None;
    }

    let Some(start) = schema.start.as_ref().and_then(|s| to_event_time(s, default_zone)) else {
        debug!(title, "dropping event without a usable start");
        return None;
    };
    let end = schema.end.as_ref().and_then(|e| to_event_time(e, default_zone));
    let event_type = schema.event_type.map(EventType::from).unwrap_or_default();

    let mut candidate = EventCandidate::new(title, start, end, event_type);
    candidate.description = non_empty(schema.description);
    candidate.location = non_empty(schema.location);
    candidate.deep_link = non_empty(schema.deep_link);
    Some(candidate)
}

fn to_event_time(schema: &DateTimeSchema, default_zone: Tz) -> Option<EventTime> {
    let raw = schema.timestamp.trim();
    let date_time = NaiveDateTime::parse_from_str(raw, EVENT_TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;

    let zone = schema
        .time_zone
        .as_deref()
        .map(str::trim)
        .filter(|name| name.parse::<Tz>().is_ok())
        .unwrap_or_else(|| default_zone.name());

    Some(EventTime::new(date_time, zone))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use schedulr_domain::CalendarFlavor;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(api_url: String) -> ChatCompletionsExtractor {
        let http_client =
            HttpClient::builder().timeout(Duration::from_secs(5)).build().expect("http client");

        ChatCompletionsExtractor::new("openai", "test-api-key", "gpt-4o-mini", api_url, http_client)
    }

    fn request() -> ExtractionRequest {
        ExtractionRequest {
            reference_time: chrono_tz::Europe::Berlin.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
            calendar: CalendarFlavor::Google,
            narrative: "Message from alice: concert friday 8pm at Tempodrom\n\n".into(),
        }
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "content": content } }],
            "usage": { "total_tokens": 321 }
        }))
    }

    #[tokio::test]
    async fn extracts_events_from_fenced_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(completion(
                "```json\n{\"result\": [{\"title\": \"Concert\", \"start\": {\"timestamp\": \"2024-06-07 20:00:00\", \"timeZone\": \"Europe/Berlin\"}, \"eventType\": \"event\", \"location\": \"Tempodrom\"}], \"explanation\": \"One event\"}\n```",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(format!("{}/v1/chat/completions", server.uri()));
        let extraction = client.extract(&request()).await.expect("should extract");

        assert_eq!(extraction.events.len(), 1);
        let event = &extraction.events[0];
        assert_eq!(event.title, "Concert");
        assert_eq!(event.location.as_deref(), Some("Tempodrom"));
        assert_eq!(
            event.end.date_time,
            NaiveDate::from_ymd_opt(2024, 6, 7).unwrap().and_hms_opt(21, 0, 0).unwrap()
        );
        assert_eq!(extraction.explanation.as_deref(), Some("One event"));
    }

    #[tokio::test]
    async fn missing_zone_falls_back_to_request_zone_and_untitled_events_are_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(
                r#"{"result": [
                    {"title": "Birthday", "start": {"timestamp": "2024-06-09 00:00:00"}, "eventType": "BIRTHDAY"},
                    {"title": "", "start": {"timestamp": "2024-06-09 10:00:00"}},
                    {"title": "No start"}
                ]}"#,
            ))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let extraction = client.extract(&request()).await.expect("should extract");

        assert_eq!(extraction.events.len(), 1);
        let birthday = &extraction.events[0];
        assert_eq!(birthday.event_type, EventType::Birthday);
        assert_eq!(birthday.start.time_zone, "Europe/Berlin");
        assert_eq!(birthday.end.date_time - birthday.start.date_time, chrono::Duration::hours(24));
    }

    #[tokio::test]
    async fn service_unavailable_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = test_client(server.uri()).extract(&request()).await.unwrap_err();

        assert!(err.retryable);
        assert_eq!(err.status, Some(503));
        assert_eq!(err.provider, "openai");
    }

    #[tokio::test]
    async fn authentication_error_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let err = test_client(server.uri()).extract(&request()).await.unwrap_err();

        assert!(!err.retryable);
        assert_eq!(err.status, Some(401));
    }

    #[tokio::test]
    async fn unparsable_content_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(completion("not valid json")).mount(&server).await;

        let err = test_client(server.uri()).extract(&request()).await.unwrap_err();

        assert!(!err.retryable);
        assert!(err.message.contains("Failed to parse events"));
    }

    #[test]
    fn presets_use_vendor_defaults() {
        let config = ProviderConfig::new("sk-test");

        let deepseek = ChatCompletionsExtractor::deepseek(&config).unwrap();
        assert_eq!(deepseek.name(), "deepseek");
        assert_eq!(deepseek.model(), "deepseek-chat");

        let mut custom = ProviderConfig::new("sk-test");
        custom.model = Some("gpt-4o".into());
        let openai = ChatCompletionsExtractor::openai(&custom).unwrap();
        assert_eq!(openai.name(), "openai");
        assert_eq!(openai.model(), "gpt-4o");
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}
