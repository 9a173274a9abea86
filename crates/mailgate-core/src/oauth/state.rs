use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::StateDir;

use super::{AuthorizationRequest, OAuthProvider};

const PENDING_LINK_RECORD: &str = "pending_link";

/// Minutes a consent round-trip may take before its nonce is discarded
const PENDING_LINK_EXPIRY_MINUTES: i64 = 15;

/// An authorization URL that has been handed out and not yet redeemed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLink {
    pub provider: OAuthProvider,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

impl PendingLink {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.created_at + Duration::minutes(PENDING_LINK_EXPIRY_MINUTES)
    }
}

impl From<&AuthorizationRequest> for PendingLink {
    fn from(req: &AuthorizationRequest) -> Self {
        Self {
            provider: req.provider,
            state: req.state.clone(),
            created_at: Utc::now(),
        }
    }
}

/// The at-most-one outstanding link attempt.
///
/// Starting a new link replaces any earlier one. Taking the pending link
/// consumes it, so a nonce is only ever checked once.
#[derive(Clone)]
pub struct PendingLinks {
    current: Arc<Mutex<Option<PendingLink>>>,
    store: Option<StateDir>,
}

impl PendingLinks {
    pub fn ephemeral() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            store: None,
        }
    }

    pub fn load(store: StateDir) -> Result<Self> {
        let pending = match store.load::<PendingLink>(PENDING_LINK_RECORD) {
            Ok(Some(stored)) if stored.age_minutes() > PENDING_LINK_EXPIRY_MINUTES => {
                debug!(age_minutes = stored.age_minutes(), "Discarding stale pending link");
                store.remove(PENDING_LINK_RECORD)?;
                None
            }
            Ok(stored) => stored.map(|s| s.data),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable pending link");
                None
            }
        };
        Ok(Self {
            current: Arc::new(Mutex::new(pending)),
            store: Some(store),
        })
    }

    pub fn record(&self, link: PendingLink) -> Result<()> {
        if let Some(ref store) = self.store {
            store
                .save(PENDING_LINK_RECORD, &link)
                .context("Failed to persist pending link")?;
        }
        debug!(provider = %link.provider, "Pending link recorded");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(link);
        Ok(())
    }

    /// Remove and return the pending link, ignoring one that has expired
    pub fn take(&self) -> Option<PendingLink> {
        let taken = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ref store) = self.store {
            if let Err(e) = store.remove(PENDING_LINK_RECORD) {
                warn!(error = %e, "Failed to remove pending link");
            }
        }
        match taken {
            Some(link) if link.is_expired() => {
                debug!(provider = %link.provider, "Pending link expired");
                None
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Stored;

    fn link(state: &str) -> PendingLink {
        PendingLink {
            provider: OAuthProvider::Gmail,
            state: state.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_take_is_one_shot() {
        let pending = PendingLinks::ephemeral();
        pending.record(link("abc")).unwrap();
        assert_eq!(pending.take().map(|l| l.state).as_deref(), Some("abc"));
        assert!(pending.take().is_none());
    }

    #[test]
    fn test_new_link_replaces_old() {
        let pending = PendingLinks::ephemeral();
        pending.record(link("first")).unwrap();
        pending.record(link("second")).unwrap();
        assert_eq!(pending.take().unwrap().state, "second");
    }

    #[test]
    fn test_expired_link_is_dropped() {
        let pending = PendingLinks::ephemeral();
        let mut old = link("old");
        old.created_at = Utc::now() - Duration::minutes(PENDING_LINK_EXPIRY_MINUTES + 1);
        pending.record(old).unwrap();
        assert!(pending.take().is_none());
    }

    #[test]
    fn test_persisted_across_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateDir::new(tmp.path().to_path_buf()).unwrap();

        PendingLinks::load(store.clone()).unwrap().record(link("xyz")).unwrap();

        let reloaded = PendingLinks::load(store.clone()).unwrap();
        assert_eq!(reloaded.take().unwrap().state, "xyz");
        assert!(PendingLinks::load(store).unwrap().take().is_none());
    }

    #[test]
    fn test_stale_record_removed_on_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateDir::new(tmp.path().to_path_buf()).unwrap();
        let path = tmp.path().join("pending_link.json");

        let stale = Stored {
            data: link("old"),
            saved_at: Utc::now() - Duration::minutes(PENDING_LINK_EXPIRY_MINUTES + 5),
        };
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        let pending = PendingLinks::load(store).unwrap();
        assert!(pending.take().is_none());
        assert!(!path.exists());
    }
}
