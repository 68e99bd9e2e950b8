//! Flush sink that runs the pipeline and replies to the transport

use std::sync::Arc;

use async_trait::async_trait;
use schedulr_domain::{ConversationId, RawMessageFragment};
use tracing::warn;

use super::coordinator::PipelineCoordinator;
use super::ports::ReplySink;
use crate::aggregation::FlushSink;

/// Connects [`AggregationBuffer`](crate::AggregationBuffer) flushes to the
/// coordinator and hands every result to a [`ReplySink`].
pub struct PipelineSink {
    coordinator: Arc<PipelineCoordinator>,
    replies: Arc<dyn ReplySink>,
}

impl PipelineSink {
    pub fn new(coordinator: Arc<PipelineCoordinator>, replies: Arc<dyn ReplySink>) -> Self {
        Self { coordinator, replies }
    }
}

#[async_trait]
impl FlushSink for PipelineSink {
    async fn on_flush(&self, conversation_id: ConversationId, fragments: Vec<RawMessageFragment>) {
        match self.coordinator.process(&conversation_id, fragments).await {
            Ok(events) => self.replies.on_scheduled(&conversation_id, &events).await,
            Err(err) => {
                warn!(%conversation_id, error = %err, "pipeline run failed");
                self.replies.on_failure(&conversation_id, &err).await;
            }
        }
    }
}
