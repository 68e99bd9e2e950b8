//! Effective timezone resolution for users.

pub mod ports;
pub mod resolver;

pub use ports::TimezoneLookup;
pub use resolver::TimeZoneResolver;
