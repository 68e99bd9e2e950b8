//! # Schedulr Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The per-conversation aggregation buffer
//! - Extraction orchestration across prioritized providers
//! - Calendar scheduling with credential refresh
//! - Timezone resolution and the pipeline coordinator
//! - Port/adapter interfaces (traits) for every external collaborator
//!
//! ## Architecture Principles
//! - Only depends on `schedulr-common` and `schedulr-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod aggregation;
pub mod extraction;
pub mod pipeline;
pub mod retry;
pub mod scheduling;
pub mod timezone;
pub mod user;

// Re-export specific items to avoid ambiguity
pub use aggregation::{build_narrative, AggregationBuffer, FlushSink};
pub use extraction::ports::{EventExtractor, ProviderExtraction};
pub use extraction::ExtractionOrchestrator;
pub use pipeline::ports::ReplySink;
pub use pipeline::{PipelineCoordinator, PipelineSink};
pub use retry::{retry_config, TransientApiErrors};
pub use scheduling::ports::{CalendarProvider, LinkedAccountRepository};
pub use scheduling::CalendarScheduler;
pub use timezone::ports::TimezoneLookup;
pub use timezone::TimeZoneResolver;
pub use user::ports::UserProfileRepository;
