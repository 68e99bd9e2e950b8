//! User profile access.

pub mod ports;

pub use ports::UserProfileRepository;
