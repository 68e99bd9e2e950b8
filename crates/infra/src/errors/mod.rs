//! Infrastructure error conversions.

pub mod conversions;

pub use conversions::{api_error_from_reqwest, InfraError};
