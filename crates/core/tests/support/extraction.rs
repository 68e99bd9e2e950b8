use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use schedulr_core::{EventExtractor, ProviderExtraction};
use schedulr_domain::{ApiError, EventCandidate, ExtractionRequest};

type Reply = Result<ProviderExtraction, ApiError>;

/// Extraction provider that replays scripted replies.
///
/// Once the script runs out the last reply is repeated.
#[derive(Clone)]
pub struct ScriptedExtractor {
    name: String,
    script: Arc<Mutex<VecDeque<Reply>>>,
    last: Arc<Mutex<Option<Reply>>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ExtractionRequest>>>,
    latency: Duration,
}

impl ScriptedExtractor {
    pub fn new(name: &str, script: Vec<Reply>) -> Self {
        Self {
            name: name.to_string(),
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
        }
    }

    pub fn returning(name: &str, events: Vec<EventCandidate>) -> Self {
        Self::new(name, vec![Ok(ProviderExtraction { events, explanation: None })])
    }

    pub fn failing(name: &str, error: ApiError) -> Self {
        Self::new(name, vec![Err(error)])
    }

    /// Each call sleeps for `latency` before replying.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventExtractor for ScriptedExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ProviderExtraction, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = next {
            *last = Some(reply);
        }
        last.clone().unwrap_or_else(|| Err(ApiError::permanent(self.name.clone(), "empty script")))
    }
}
