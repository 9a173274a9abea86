use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::store::StateDir;

/// Name under which the session credential is persisted
pub const SESSION_RECORD: &str = "token";

/// Days a credential stays valid after issuance
const TOKEN_EXPIRY_DAYS: i64 = 7;

/// Display name used when the token carries no readable name claim
const DEFAULT_DISPLAY_NAME: &str = "User";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Transport-security flags attached to a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieAttributes {
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Strict,
        }
    }
}

/// Claims read from the token payload for display. Never used for authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

/// Bearer credential for the backend. Replaced wholesale, never edited in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    value: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    attributes: CookieAttributes,
}

impl SessionCredential {
    /// Issue a credential for a freshly obtained access token
    pub fn issue(value: impl Into<String>) -> Self {
        Self::issue_at(value, Utc::now())
    }

    pub fn issue_at(value: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            issued_at,
            expires_at: issued_at + Duration::days(TOKEN_EXPIRY_DAYS),
            attributes: CookieAttributes::default(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn attributes(&self) -> CookieAttributes {
        self.attributes
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Render as a `Set-Cookie` style string
    pub fn to_cookie_string(&self) -> String {
        let mut cookie = format!(
            "{}={}; Expires={}; Path=/",
            SESSION_RECORD,
            self.value,
            self.expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
        );
        if self.attributes.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(self.attributes.same_site.as_str());
        cookie
    }

    /// Decode the JWT payload without verifying it
    pub fn claims(&self) -> Option<TokenClaims> {
        let payload = self.value.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn display_name(&self) -> String {
        self.claims()
            .and_then(|c| c.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Process-wide owner of the session credential.
///
/// Cloning yields another handle to the same credential. Login writes it,
/// logout clears it, everything else reads. When backed by a state
/// directory every write and clear is persisted before it becomes visible.
#[derive(Clone)]
pub struct SessionContext {
    current: Arc<RwLock<Option<SessionCredential>>>,
    store: Option<StateDir>,
}

impl SessionContext {
    /// A context that lives only in memory
    pub fn ephemeral() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            store: None,
        }
    }

    /// Open a persisted context, dropping a stored credential that has expired
    pub fn load(store: StateDir) -> Result<Self> {
        let stored = match store.load::<SessionCredential>(SESSION_RECORD) {
            Ok(stored) => stored.map(|s| s.data),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session record");
                store.remove(SESSION_RECORD)?;
                None
            }
        };

        let credential = match stored {
            Some(c) if c.is_expired() => {
                info!(expired_at = %c.expires_at(), "Stored session expired");
                store.remove(SESSION_RECORD)?;
                None
            }
            other => other,
        };
        debug!(present = credential.is_some(), "Session loaded");

        Ok(Self {
            current: Arc::new(RwLock::new(credential)),
            store: Some(store),
        })
    }

    /// Current credential, if one exists and has not expired
    pub fn read(&self) -> Option<SessionCredential> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().filter(|c| !c.is_expired()).cloned()
    }

    /// Bearer token of the current credential
    pub fn token(&self) -> Option<String> {
        self.read().map(|c| c.value)
    }

    pub fn is_present(&self) -> bool {
        self.read().is_some()
    }

    /// Replace the current credential
    pub fn write(&self, credential: SessionCredential) -> Result<()> {
        if let Some(ref store) = self.store {
            store
                .save(SESSION_RECORD, &credential)
                .context("Failed to persist session")?;
        }
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(credential);
        Ok(())
    }

    /// Destroy the current credential
    pub fn clear(&self) -> Result<()> {
        if let Some(ref store) = self.store {
            store
                .remove(SESSION_RECORD)
                .context("Failed to remove persisted session")?;
        }
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("present", &self.is_present())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
