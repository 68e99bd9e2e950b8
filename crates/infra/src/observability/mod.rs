//! Observability infrastructure
//!
//! Structured logging through `tracing`. Every service emits structured
//! fields; this module only decides where and how they are written.

pub mod logging;

pub use logging::{build_filter, init_tracing};
