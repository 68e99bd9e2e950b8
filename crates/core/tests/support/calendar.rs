use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schedulr_core::CalendarProvider;
use schedulr_domain::{ApiError, CalendarFlavor, EventCandidate, RefreshedToken};

use super::CallLog;

/// Calendar provider with scripted insert failures and a fixed refresh
/// result. Inserts that are not scripted succeed with a link derived from
/// the event title.
#[derive(Clone)]
pub struct MockCalendarProvider {
    log: CallLog,
    insert_script: Arc<Mutex<VecDeque<Result<String, ApiError>>>>,
    refresh: Arc<Mutex<Result<RefreshedToken, ApiError>>>,
    inserted: Arc<Mutex<Vec<EventCandidate>>>,
    refresh_delay: Duration,
}

impl MockCalendarProvider {
    pub fn new(log: CallLog, refreshed_expiry: DateTime<Utc>) -> Self {
        Self {
            log,
            insert_script: Arc::new(Mutex::new(VecDeque::new())),
            refresh: Arc::new(Mutex::new(Ok(RefreshedToken {
                access_token: "refreshed-access".into(),
                refresh_token: Some("rotated-refresh".into()),
                expiry: refreshed_expiry,
            }))),
            inserted: Arc::new(Mutex::new(Vec::new())),
            refresh_delay: Duration::ZERO,
        }
    }

    pub fn with_insert_results(self, results: Vec<Result<String, ApiError>>) -> Self {
        self.insert_script.lock().unwrap().extend(results);
        self
    }

    pub fn with_refresh_error(self, error: ApiError) -> Self {
        *self.refresh.lock().unwrap() = Err(error);
        self
    }

    /// Suspend inside `refresh_token` so concurrent runs can interleave.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn inserted(&self) -> Vec<EventCandidate> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    fn flavor(&self) -> CalendarFlavor {
        CalendarFlavor::Google
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedToken, ApiError> {
        self.log.lock().unwrap().push(format!("refresh:{refresh_token}"));
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        self.refresh.lock().unwrap().clone()
    }

    async fn insert_event(
        &self,
        access_token: &str,
        event: &EventCandidate,
    ) -> Result<String, ApiError> {
        self.log.lock().unwrap().push(format!("insert:{access_token}"));
        let scripted = self.insert_script.lock().unwrap().pop_front();
        let result = scripted
            .unwrap_or_else(|| Ok(format!("https://calendar.example/{}", event.title)));
        if result.is_ok() {
            self.inserted.lock().unwrap().push(event.clone());
        }
        result
    }
}
