use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schedulr_core::{LinkedAccountRepository, ReplySink, TimezoneLookup, UserProfileRepository};
use schedulr_domain::{
    CalendarFlavor, ConversationId, GeoPoint, LinkedAccount, Result as DomainResult,
    ScheduledEvent, SchedulrError, UserId, UserProfile,
};

use super::CallLog;

/// In-memory linked accounts; every save is appended to the shared log.
#[derive(Clone)]
pub struct InMemoryAccounts {
    log: CallLog,
    accounts: Arc<Mutex<HashMap<(UserId, CalendarFlavor), LinkedAccount>>>,
}

impl InMemoryAccounts {
    pub fn new(log: CallLog) -> Self {
        Self { log, accounts: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn with_account(self, account: LinkedAccount) -> Self {
        self.accounts.lock().unwrap().insert((account.user_id, account.provider), account);
        self
    }

    pub fn get(&self, user_id: UserId, provider: CalendarFlavor) -> Option<LinkedAccount> {
        self.accounts.lock().unwrap().get(&(user_id, provider)).cloned()
    }
}

#[async_trait]
impl LinkedAccountRepository for InMemoryAccounts {
    async fn get_linked_account(
        &self,
        user_id: UserId,
        provider: CalendarFlavor,
    ) -> DomainResult<Option<LinkedAccount>> {
        Ok(self.get(user_id, provider))
    }

    async fn save_linked_account(&self, account: &LinkedAccount) -> DomainResult<()> {
        self.log.lock().unwrap().push(format!("save:{}", account.access_token));
        self.accounts.lock().unwrap().insert((account.user_id, account.provider), account.clone());
        Ok(())
    }

    async fn delete_linked_account(
        &self,
        user_id: UserId,
        provider: CalendarFlavor,
    ) -> DomainResult<()> {
        self.accounts.lock().unwrap().remove(&(user_id, provider));
        Ok(())
    }
}

/// Profiles keyed by conversation id.
#[derive(Default, Clone)]
pub struct InMemoryProfiles {
    profiles: Arc<Mutex<HashMap<ConversationId, UserProfile>>>,
    lookups: Arc<Mutex<usize>>,
}

impl InMemoryProfiles {
    pub fn with_profile(self, conversation_id: &str, profile: UserProfile) -> Self {
        self.profiles.lock().unwrap().insert(ConversationId::from(conversation_id), profile);
        self
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    pub fn get(&self, conversation_id: &str) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(&ConversationId::from(conversation_id)).cloned()
    }
}

#[async_trait]
impl UserProfileRepository for InMemoryProfiles {
    async fn get_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> DomainResult<Option<UserProfile>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.profiles.lock().unwrap().get(conversation_id).cloned())
    }

    async fn save(&self, profile: &UserProfile) -> DomainResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        for stored in profiles.values_mut().filter(|p| p.id == profile.id) {
            *stored = profile.clone();
        }
        Ok(())
    }
}

/// Timezone lookup answering with a fixed zone name.
pub struct StaticLookup(pub &'static str);

#[async_trait]
impl TimezoneLookup for StaticLookup {
    async fn timezone_at(&self, _point: GeoPoint) -> DomainResult<String> {
        Ok(self.0.to_string())
    }
}

/// Reply sink that records what the transport would render.
#[derive(Default, Clone)]
pub struct RecordingReplySink {
    scheduled: Arc<Mutex<Vec<(ConversationId, Vec<ScheduledEvent>)>>>,
    failures: Arc<Mutex<Vec<(ConversationId, SchedulrError)>>>,
}

impl RecordingReplySink {
    pub fn scheduled(&self) -> Vec<(ConversationId, Vec<ScheduledEvent>)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<(ConversationId, SchedulrError)> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySink for RecordingReplySink {
    async fn on_scheduled(&self, conversation_id: &ConversationId, events: &[ScheduledEvent]) {
        self.scheduled.lock().unwrap().push((conversation_id.clone(), events.to_vec()));
    }

    async fn on_failure(&self, conversation_id: &ConversationId, error: &SchedulrError) {
        self.failures.lock().unwrap().push((conversation_id.clone(), error.clone()));
    }
}
