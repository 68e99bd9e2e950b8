//! Account linking over the OAuth authorization-code flow.
//!
//! A link starts with [`AccountLinker::begin_link`], which registers a
//! single-use state token and returns the consent URL. The OAuth callback
//! hands `(state, code)` to [`AccountLinker::complete_link`]. Pending states
//! expire after a TTL; [`AccountLinker::spawn_sweeper`] purges stale ones in
//! the background.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use schedulr_core::LinkedAccountRepository;
use schedulr_domain::{CalendarFlavor, LinkedAccount, Result, SchedulrError, UserId};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::oauth::GoogleOAuthClient;

#[derive(Debug, Clone, Copy)]
struct PendingLink {
    user_id: UserId,
    created_at: Instant,
}

/// Links Google Calendar accounts to users.
pub struct AccountLinker {
    oauth: GoogleOAuthClient,
    accounts: Arc<dyn LinkedAccountRepository>,
    pending: DashMap<String, PendingLink>,
    state_ttl: Duration,
}

impl AccountLinker {
    pub fn new(
        oauth: GoogleOAuthClient,
        accounts: Arc<dyn LinkedAccountRepository>,
        state_ttl: Duration,
    ) -> Self {
        Self { oauth, accounts, pending: DashMap::new(), state_ttl }
    }

    /// Register a pending link for `user_id` and return the consent URL.
    #[instrument(skip(self))]
    pub fn begin_link(&self, user_id: UserId) -> String {
        let state = Uuid::now_v7().to_string();
        self.pending.insert(state.clone(), PendingLink { user_id, created_at: Instant::now() });
        debug!(pending = self.pending.len(), "link state registered");
        self.oauth.authorization_url(&state)
    }

    /// Finish a link from the OAuth callback.
    ///
    /// The state is consumed whether or not the exchange succeeds.
    ///
    /// # Errors
    /// `InvalidInput` for an unknown or expired state, `Auth` when the code
    /// exchange fails, or the repository's storage error.
    #[instrument(skip(self, state, code))]
    pub async fn complete_link(&self, state: &str, code: &str) -> Result<UserId> {
        let Some((_, pending)) = self.pending.remove(state) else {
            return Err(SchedulrError::InvalidInput("unknown or already used link state".into()));
        };

        if pending.created_at.elapsed() >= self.state_ttl {
            warn!(user_id = %pending.user_id, "link state expired");
            return Err(SchedulrError::InvalidInput("link state expired".into()));
        }

        let token = self.oauth.exchange_code(code).await.map_err(|err| {
            warn!(user_id = %pending.user_id, error = %err, "authorization code exchange failed");
            SchedulrError::Auth(err.to_string())
        })?;

        let Some(refresh_token) = token.refresh_token else {
            return Err(SchedulrError::Auth("token response carried no refresh token".into()));
        };

        let account = LinkedAccount {
            user_id: pending.user_id,
            provider: CalendarFlavor::Google,
            access_token: token.access_token,
            refresh_token,
            expiry: token.expiry,
        };
        self.accounts.save_linked_account(&account).await?;

        info!(user_id = %pending.user_id, "calendar account linked");
        Ok(pending.user_id)
    }

    /// Remove the stored credential for `(user_id, provider)`.
    #[instrument(skip(self))]
    pub async fn unlink(&self, user_id: UserId, provider: CalendarFlavor) -> Result<()> {
        self.accounts.delete_linked_account(user_id, provider).await?;
        info!("calendar account unlinked");
        Ok(())
    }

    pub fn pending_links(&self) -> usize {
        self.pending.len()
    }

    /// Drop pending states older than the TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, link| link.created_at.elapsed() < self.state_ttl);
        before.saturating_sub(self.pending.len())
    }

    /// Purge expired states every `interval` until `cancel` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let linker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("link state sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let purged = linker.purge_expired();
                        if purged > 0 {
                            debug!(purged, "expired link states purged");
                        }
                    }
                }
            }
        })
    }
}
