//! Domain types for the aggregation and scheduling pipeline.

pub mod account;
pub mod event;
pub mod message;
pub mod user;

pub use account::{LinkedAccount, RefreshedToken};
pub use event::{
    CalendarFlavor, EventCandidate, EventTime, EventType, Extraction, ExtractionRequest,
    ScheduleOutcome, ScheduledEvent,
};
pub use message::{ConversationId, LinkAnnotation, RawMessageFragment};
pub use user::{GeoPoint, UserId, UserProfile};
