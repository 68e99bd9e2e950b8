//! Multi-provider extraction with per-provider retry and ordered fallback.

pub mod orchestrator;
pub mod ports;

pub use orchestrator::ExtractionOrchestrator;
pub use ports::{EventExtractor, ProviderExtraction};
