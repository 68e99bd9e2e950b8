//! Per-conversation mailbox with a sliding quiet-period timer.
//!
//! Every [`AggregationBuffer::add`] restarts the conversation's timer. When
//! the timer survives a full quiet period the batch is removed from the map
//! and handed to the [`FlushSink`] outside of any lock. Each scheduled timer
//! carries the generation of the add that created it; a timer whose
//! generation no longer matches the entry is stale and drains nothing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use schedulr_domain::{ConversationId, RawMessageFragment, Result, SchedulrError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receiver of batches whose quiet period elapsed.
#[async_trait]
pub trait FlushSink: Send + Sync + 'static {
    async fn on_flush(&self, conversation_id: ConversationId, fragments: Vec<RawMessageFragment>);
}

#[derive(Default)]
struct PendingBatch {
    fragments: Vec<RawMessageFragment>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    entries: DashMap<ConversationId, PendingBatch>,
    quiet_period: Duration,
    sink: Arc<dyn FlushSink>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl Inner {
    async fn fire(&self, conversation_id: ConversationId, generation: u64) {
        let drained =
            self.entries.remove_if(&conversation_id, |_, batch| batch.generation == generation);

        let Some((conversation_id, batch)) = drained else {
            debug!(%conversation_id, generation, "stale debounce timer ignored");
            return;
        };

        if batch.fragments.is_empty() {
            return;
        }

        info!(
            %conversation_id,
            fragments = batch.fragments.len(),
            "quiet period elapsed, flushing conversation"
        );
        self.sink.on_flush(conversation_id, batch.fragments).await;
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for mut entry in self.entries.iter_mut() {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
        }
    }
}

/// Debounce buffer keyed by conversation.
///
/// Cheap to clone; clones share the same entries. Dropping the last clone
/// aborts all pending timers.
#[derive(Clone)]
pub struct AggregationBuffer {
    inner: Arc<Inner>,
}

impl AggregationBuffer {
    pub fn new(quiet_period: Duration, sink: Arc<dyn FlushSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                quiet_period,
                sink,
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Append a fragment and restart the conversation's quiet-period timer.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns `SchedulrError::Internal` after [`shutdown`](Self::shutdown) or
    /// when no runtime is available to host the timer.
    pub fn add(&self, conversation_id: ConversationId, fragment: RawMessageFragment) -> Result<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(SchedulrError::Internal("aggregation buffer is shut down".into()));
        }
        let runtime = Handle::try_current()
            .map_err(|e| SchedulrError::Internal(format!("no async runtime for debounce: {e}")))?;

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut batch = self.inner.entries.entry(conversation_id.clone()).or_default();

        batch.fragments.push(fragment);
        batch.generation = generation;
        if let Some(previous) = batch.timer.take() {
            previous.abort();
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let quiet_period = self.inner.quiet_period;
        let key = conversation_id.clone();
        batch.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(key, generation).await;
            }
        }));

        debug!(%conversation_id, generation, buffered = batch.fragments.len(), "fragment buffered");
        Ok(())
    }

    /// Atomically remove and return the buffered fragments, cancelling the
    /// pending timer. Empty when nothing is buffered.
    pub fn flush(&self, conversation_id: &ConversationId) -> Vec<RawMessageFragment> {
        match self.inner.entries.remove(conversation_id) {
            Some((_, mut batch)) => {
                if let Some(timer) = batch.timer.take() {
                    timer.abort();
                }
                batch.fragments
            }
            None => Vec::new(),
        }
    }

    /// Number of fragments currently buffered for a conversation.
    pub fn pending(&self, conversation_id: &ConversationId) -> usize {
        self.inner.entries.get(conversation_id).map_or(0, |batch| batch.fragments.len())
    }

    pub fn pending_conversations(&self) -> usize {
        self.inner.entries.len()
    }

    /// Stop accepting fragments and hand back everything still buffered.
    ///
    /// Buffers are volatile: whatever the caller does not process here is
    /// lost.
    pub fn shutdown(&self) -> Vec<(ConversationId, Vec<RawMessageFragment>)> {
        self.inner.closed.store(true, Ordering::Release);

        let keys: Vec<ConversationId> =
            self.inner.entries.iter().map(|entry| entry.key().clone()).collect();
        let drained: Vec<_> = keys
            .into_iter()
            .filter_map(|key| {
                let fragments = self.flush(&key);
                (!fragments.is_empty()).then_some((key, fragments))
            })
            .collect();

        if !drained.is_empty() {
            warn!(conversations = drained.len(), "aggregation buffer shut down with pending fragments");
        }
        drained
    }
}
