//! Per-conversation debounce of inbound message fragments.

pub mod buffer;
pub mod narrative;

pub use buffer::{AggregationBuffer, FlushSink};
pub use narrative::build_narrative;
