//! External service integrations

pub mod calendar;
pub mod llm;
pub mod timezone;

pub use calendar::{AccountLinker, GoogleCalendarProvider, GoogleOAuthClient};
pub use llm::ChatCompletionsExtractor;
pub use timezone::GoogleTimezoneLookup;
