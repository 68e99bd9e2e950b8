//! Event candidates produced by extraction and their scheduling outcome.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::SchedulrError;
use crate::impl_domain_enum_conversions;

/// Calendar product the user schedules into. Drives how deep links are
/// phrased by extraction providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarFlavor {
    #[default]
    Google,
    Outlook,
    Yandex,
    Apple,
}

impl_domain_enum_conversions!(CalendarFlavor {
    Google => "google",
    Outlook => "outlook",
    Yandex => "yandex",
    Apple => "apple",
});

impl CalendarFlavor {
    /// Product name as presented to extraction providers.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google Calendar",
            Self::Outlook => "Outlook Calendar",
            Self::Yandex => "Yandex Calendar",
            Self::Apple => "Apple Calendar",
        }
    }
}

/// Closed set of event kinds. Unknown labels from providers map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EventType {
    #[default]
    Event,
    Reminder,
    Meeting,
    Birthday,
    Holiday,
    Other,
}

impl_domain_enum_conversions!(EventType {
    Event => "event",
    Reminder => "reminder",
    Meeting => "meeting",
    Birthday => "birthday",
    Holiday => "holiday",
    Other => "other",
});

impl EventType {
    pub const ALL: [EventType; 6] =
        [Self::Event, Self::Reminder, Self::Meeting, Self::Birthday, Self::Holiday, Self::Other];

    /// Duration applied when a provider omits the end of an event.
    pub fn default_duration(self) -> Duration {
        match self {
            Self::Reminder => Duration::minutes(30),
            Self::Birthday | Self::Holiday => Duration::hours(24),
            Self::Event | Self::Meeting | Self::Other => Duration::hours(1),
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        EventType::from_str(value.trim()).unwrap_or(EventType::Other)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.to_string()
    }
}

/// Wall-clock timestamp paired with the IANA zone it is expressed in.
///
/// No UTC normalization happens here; the calendar receives exactly this
/// local time and zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    pub date_time: NaiveDateTime,
    pub time_zone: String,
}

impl EventTime {
    pub fn new(date_time: NaiveDateTime, time_zone: impl Into<String>) -> Self {
        Self { date_time, time_zone: time_zone.into() }
    }

    /// Parsed zone, `None` when the name is not a known IANA identifier.
    pub fn tz(&self) -> Option<Tz> {
        self.time_zone.parse().ok()
    }

    /// Same zone, shifted wall clock.
    pub fn plus(&self, duration: Duration) -> Self {
        Self { date_time: self.date_time + duration, time_zone: self.time_zone.clone() }
    }
}

/// Structured event proposed by an extraction provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCandidate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub event_type: EventType,
    /// Universal link that adds the event to the user's calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_link: Option<String>,
}

impl EventCandidate {
    /// Build a candidate, defaulting the end from the event type when absent.
    pub fn new(
        title: impl Into<String>,
        start: EventTime,
        end: Option<EventTime>,
        event_type: EventType,
    ) -> Self {
        let end = end.unwrap_or_else(|| start.plus(event_type.default_duration()));
        Self {
            title: title.into(),
            description: None,
            start,
            end,
            location: None,
            event_type,
            deep_link: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Input handed to every extraction provider.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// "Now" in the user's resolved zone; relative dates resolve against it.
    pub reference_time: DateTime<Tz>,
    pub calendar: CalendarFlavor,
    pub narrative: String,
}

impl ExtractionRequest {
    pub fn timezone(&self) -> Tz {
        self.reference_time.timezone()
    }
}

/// Successful, non-empty extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub events: Vec<EventCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Name of the provider that produced the events.
    pub provider: String,
}

/// Per-event result of the scheduling step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled,
    NotLinked,
    /// The linked account could not be read from storage.
    AccountUnavailable(String),
    RefreshFailed(String),
    InsertFailed(String),
}

impl ScheduleOutcome {
    /// Error category for an unscheduled event, `None` when it was scheduled.
    pub fn error(&self) -> Option<SchedulrError> {
        match self {
            Self::Scheduled => None,
            Self::NotLinked => {
                Some(SchedulrError::AccountNotLinked("no linked calendar account".into()))
            }
            Self::AccountUnavailable(reason) => Some(SchedulrError::Storage(reason.clone())),
            Self::RefreshFailed(reason) => Some(SchedulrError::TokenRefreshFailed(reason.clone())),
            Self::InsertFailed(reason) => Some(SchedulrError::InsertExhausted(reason.clone())),
        }
    }
}

/// Event candidate plus the link returned by the calendar, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub event: EventCandidate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub outcome: ScheduleOutcome,
}

impl ScheduledEvent {
    pub fn scheduled(event: EventCandidate, link: impl Into<String>) -> Self {
        Self { event, link: Some(link.into()), outcome: ScheduleOutcome::Scheduled }
    }

    pub fn unscheduled(event: EventCandidate, outcome: ScheduleOutcome) -> Self {
        Self { event, link: None, outcome }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self.outcome, ScheduleOutcome::Scheduled)
    }
}
