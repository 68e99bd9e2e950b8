//! End-to-end pipeline: flush → profile → timezone → extraction → scheduling.

pub mod coordinator;
pub mod ports;
pub mod sink;

pub use coordinator::PipelineCoordinator;
pub use ports::ReplySink;
pub use sink::PipelineSink;
