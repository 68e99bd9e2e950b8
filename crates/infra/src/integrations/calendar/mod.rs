//! Calendar integrations
//!
//! Provides Google Calendar event insertion, the OAuth2 code/refresh
//! exchange and the account linking flow built on top of it.

pub mod google;
pub mod linking;
pub mod oauth;

pub use google::GoogleCalendarProvider;
pub use linking::AccountLinker;
pub use oauth::GoogleOAuthClient;
