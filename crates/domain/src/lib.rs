//! # Schedulr Domain
//!
//! Business domain types for the message aggregation and event scheduling
//! pipeline.
//!
//! This crate contains:
//! - Message, event and credential types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Schedulr crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
