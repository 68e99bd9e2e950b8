//! Chat-completions wire types and the event payload models return
use serde::{Deserialize, Serialize};

/// Internal types for OpenAI-compatible Chat Completions APIs
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self { format_type: "json_object".to_string() }
    }
}

/// Response from a Chat Completions API
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    pub total_tokens: u32,
}

/// JSON document the model is instructed to return
#[derive(Debug, Deserialize)]
pub(crate) struct EventsPayload {
    #[serde(default)]
    pub result: Vec<EventSchema>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct EventSchema {
    pub title: String,
    pub description: Option<String>,
    pub start: Option<DateTimeSchema>,
    pub end: Option<DateTimeSchema>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub deep_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DateTimeSchema {
    pub timestamp: String,
    pub time_zone: Option<String>,
}
