//! # Schedulr Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Configuration loading (environment and TOML/JSON files)
//! - The shared HTTP client and error classification
//! - Provider adapters (chat-completions extraction, Google Calendar,
//!   Google Time Zone) and the OAuth account linking flow
//! - Tracing setup and pipeline assembly
//!
//! ## Architecture
//! - Implements traits defined in `schedulr-core`
//! - Depends on `schedulr-common`, `schedulr-domain` and `schedulr-core`
//! - Contains all "impure" code (network I/O, environment)

pub mod assembly;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use assembly::{build_pipeline, Collaborators, Pipeline};
pub use config::{load as load_config, load_from_file as load_config_from_file};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::*;
pub use observability::init_tracing;
