//! Calendar scheduler - inserts extracted events into linked calendars

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use schedulr_common::resilience::{RetryConfig, RetryError, RetryExecutor};
use schedulr_common::time::Clock;
use schedulr_domain::{
    ApiError, CalendarFlavor, EventCandidate, ScheduleOutcome, ScheduledEvent, UserId,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::{CalendarProvider, LinkedAccountRepository};
use crate::retry::TransientApiErrors;

type AccountKey = (UserId, CalendarFlavor);

/// Credential state for one event after the account lookup.
enum Credential {
    Ready(String),
    Unavailable(ScheduleOutcome),
}

/// Best-effort, per-event calendar scheduling.
///
/// Each event resolves the linked account afresh. Expired credentials are
/// refreshed and persisted under a per-account lock before the new token is
/// used, so concurrent runs for the same account never insert with a stale
/// token. Inserts are retried for transient failures only. Lock entries are
/// dropped once no run holds or awaits them.
pub struct CalendarScheduler {
    providers: HashMap<CalendarFlavor, Arc<dyn CalendarProvider>>,
    accounts: Arc<dyn LinkedAccountRepository>,
    clock: Arc<dyn Clock>,
    executor: RetryExecutor<TransientApiErrors>,
    account_locks: DashMap<AccountKey, Arc<Mutex<()>>>,
}

impl CalendarScheduler {
    pub fn new(
        accounts: Arc<dyn LinkedAccountRepository>,
        clock: Arc<dyn Clock>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            providers: HashMap::new(),
            accounts,
            clock,
            executor: RetryExecutor::new(retry, TransientApiErrors),
            account_locks: DashMap::new(),
        }
    }

    /// Register a calendar provider; replaces any provider of the same flavor.
    pub fn with_provider(mut self, provider: Arc<dyn CalendarProvider>) -> Self {
        self.providers.insert(provider.flavor(), provider);
        self
    }

    pub fn supports(&self, calendar: CalendarFlavor) -> bool {
        self.providers.contains_key(&calendar)
    }

    /// Schedule every event into the user's `calendar`.
    ///
    /// The returned list has one entry per input event, in input order.
    /// Every failure, storage errors included, is reported per event through
    /// [`ScheduleOutcome`]; events already inserted are always reported.
    #[instrument(skip(self, events), fields(user_id = %user_id, calendar = %calendar, events = events.len()))]
    pub async fn schedule(
        &self,
        user_id: UserId,
        calendar: CalendarFlavor,
        events: Vec<EventCandidate>,
    ) -> Vec<ScheduledEvent> {
        let Some(provider) = self.providers.get(&calendar).cloned() else {
            warn!("no calendar provider registered, returning events unscheduled");
            return events
                .into_iter()
                .map(|event| ScheduledEvent::unscheduled(event, ScheduleOutcome::NotLinked))
                .collect();
        };

        let mut scheduled = Vec::with_capacity(events.len());
        for event in events {
            let credential = self.credential_for(user_id, provider.as_ref()).await;
            let access_token = match credential {
                Credential::Ready(token) => token,
                Credential::Unavailable(outcome) => {
                    scheduled.push(ScheduledEvent::unscheduled(event, outcome));
                    continue;
                }
            };

            scheduled.push(self.insert(provider.as_ref(), &access_token, event).await);
        }

        let ok = scheduled.iter().filter(|s| s.is_scheduled()).count();
        info!(scheduled = ok, unscheduled = scheduled.len() - ok, "scheduling finished");
        scheduled
    }

    async fn credential_for(&self, user_id: UserId, provider: &dyn CalendarProvider) -> Credential {
        let key = (user_id, provider.flavor());
        let lock = self.account_lock(key);
        let credential = {
            let _guard = lock.lock().await;
            self.load_credential(user_id, provider).await
        };
        self.release_account_lock(&key, &lock);
        credential
    }

    async fn load_credential(&self, user_id: UserId, provider: &dyn CalendarProvider) -> Credential {
        let flavor = provider.flavor();
        let mut account = match self.accounts.get_linked_account(user_id, flavor).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!("no linked account");
                return Credential::Unavailable(ScheduleOutcome::NotLinked);
            }
            Err(err) => {
                warn!(error = %err, "linked account could not be loaded");
                return Credential::Unavailable(ScheduleOutcome::AccountUnavailable(err.to_string()));
            }
        };

        if !account.is_expired(self.clock.now_utc()) {
            return Credential::Ready(account.access_token);
        }

        info!(expiry = %account.expiry, "access token expired, refreshing");
        let refreshed = match provider.refresh_token(&account.refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                return Credential::Unavailable(ScheduleOutcome::RefreshFailed(err.to_string()));
            }
        };
        account.apply_refresh(refreshed);

        if let Err(err) = self.accounts.save_linked_account(&account).await {
            warn!(error = %err, "refreshed token could not be persisted");
            return Credential::Unavailable(ScheduleOutcome::RefreshFailed(format!(
                "could not persist refreshed token: {err}"
            )));
        }

        Credential::Ready(account.access_token)
    }

    async fn insert(
        &self,
        provider: &dyn CalendarProvider,
        access_token: &str,
        event: EventCandidate,
    ) -> ScheduledEvent {
        let candidate = &event;
        let outcome = self
            .executor
            .execute_with_outcome(move || provider.insert_event(access_token, candidate))
            .await;

        match outcome.result {
            Ok(link) => {
                debug!(attempts = outcome.attempts, title = %event.title, "event inserted");
                ScheduledEvent::scheduled(event, link)
            }
            Err(err) => {
                let reason = insert_failure(&err);
                warn!(attempts = outcome.attempts, error = %reason, "event insert failed");
                ScheduledEvent::unscheduled(event, ScheduleOutcome::InsertFailed(reason))
            }
        }
    }

    fn account_lock(&self, key: AccountKey) -> Arc<Mutex<()>> {
        Arc::clone(self.account_locks.entry(key).or_default().value())
    }

    /// Drop the entry when the map and `held` are its only owners. Clones
    /// are taken under the shard lock, so none can appear during the check.
    fn release_account_lock(&self, key: &AccountKey, held: &Arc<Mutex<()>>) {
        self.account_locks
            .remove_if(key, |_, lock| Arc::ptr_eq(lock, held) && Arc::strong_count(lock) == 2);
    }
}

fn insert_failure(err: &RetryError<ApiError>) -> String {
    match err.last_error() {
        Some(last) => last.to_string(),
        None => err.to_string(),
    }
}
