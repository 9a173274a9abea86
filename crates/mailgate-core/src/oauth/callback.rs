//! Completion of the OAuth account-linking handshake.
//!
//! The provider redirects back with a single-use `code`. The handler trades
//! it with the backend at most once per handler, no matter how many times
//! the hosting view re-activates it with the same redirect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use reqwest::Url;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::auth::SessionContext;
use crate::routes::{Navigation, Route};

use super::{LinkError, OAuthProvider, PendingLinks};

/// Query parameters the provider attaches to the redirect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse a raw query string (without the leading `?`). Empty values count as absent.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url_query_pairs(query) {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "code" => params.code = Some(value),
                "state" => params.state = Some(value),
                "error" => params.error = Some(value),
                _ => {}
            }
        }
        params
    }

    /// Parse a full redirect URL, identifying the provider from its path
    pub fn from_redirect_url(redirect: &str) -> Result<(OAuthProvider, Self), LinkError> {
        let url = Url::parse(redirect).map_err(|_| LinkError::NotACallback(redirect.to_string()))?;
        let provider = OAuthProvider::from_route(Route::from_path(url.path()))
            .ok_or_else(|| LinkError::NotACallback(redirect.to_string()))?;
        Ok((provider, Self::from_query(url.query().unwrap_or(""))))
    }
}

fn url_query_pairs(query: &str) -> Vec<(String, String)> {
    let mut url = match Url::parse("http://callback.invalid/") {
        Ok(url) => url,
        Err(_) => return Vec::new(),
    };
    url.set_query(Some(query.trim_start_matches('?')));
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Why a handshake ended without linking an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The redirect carried no authorization code
    MissingCode,
    /// The provider reported an error instead of a code
    ProviderDenied(String),
    /// No local session to attach the account to
    NoSession,
    /// The returned `state` did not match the one issued with the consent URL
    StateMismatch,
    /// The backend refused the code, or could not be reached
    ExchangeFailed(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::MissingCode => write!(f, "no authorization code in redirect"),
            FailureReason::ProviderDenied(reason) => write!(f, "provider returned error: {}", reason),
            FailureReason::NoSession => write!(f, "no session credential"),
            FailureReason::StateMismatch => write!(f, "state parameter mismatch"),
            FailureReason::ExchangeFailed(reason) => write!(f, "code exchange failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackPhase {
    AwaitingCode,
    Exchanging,
    Linked,
    Failed(FailureReason),
}

impl CallbackPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallbackPhase::Linked | CallbackPhase::Failed(_))
    }

    pub fn navigation(&self) -> Navigation {
        match self {
            CallbackPhase::AwaitingCode | CallbackPhase::Exchanging => Navigation::Pending,
            CallbackPhase::Linked => Navigation::Redirect(Route::Home),
            CallbackPhase::Failed(_) => Navigation::Redirect(Route::Auth),
        }
    }
}

/// Handler for one callback view activation sequence
pub struct CallbackHandler {
    provider: OAuthProvider,
    api: ApiClient,
    session: SessionContext,
    pending: PendingLinks,
    activated: AtomicBool,
    phase: Mutex<CallbackPhase>,
}

impl CallbackHandler {
    pub fn new(
        provider: OAuthProvider,
        api: ApiClient,
        session: SessionContext,
        pending: PendingLinks,
    ) -> Self {
        Self {
            provider,
            api,
            session,
            pending,
            activated: AtomicBool::new(false),
            phase: Mutex::new(CallbackPhase::AwaitingCode),
        }
    }

    pub fn provider(&self) -> OAuthProvider {
        self.provider
    }

    pub fn phase(&self) -> CallbackPhase {
        self.phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Move to `phase` unless a terminal phase has already been reached
    fn set_phase(&self, phase: CallbackPhase) {
        let mut current = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if !current.is_terminal() {
            *current = phase;
        }
    }

    fn fail(&self, reason: FailureReason) -> Navigation {
        warn!(provider = %self.provider, %reason, "Account link failed");
        self.set_phase(CallbackPhase::Failed(reason));
        self.phase().navigation()
    }

    /// Compare the returned `state` with the one issued for this attempt.
    ///
    /// Consumes the pending link either way. A redirect with no `state` is
    /// accepted only when no nonce was issued.
    fn check_state(&self, params: &CallbackParams) -> Result<(), FailureReason> {
        let issued = self.pending.take();
        match (issued, params.state.as_deref()) {
            (Some(link), Some(returned)) if link.provider == self.provider && link.state == returned => {
                Ok(())
            }
            (None, None) => {
                warn!(provider = %self.provider, "Callback has no state parameter, cannot verify origin");
                Ok(())
            }
            _ => Err(FailureReason::StateMismatch),
        }
    }

    /// Process a (re-)activation of the callback view.
    ///
    /// Re-activations after the first one never reach the network: they
    /// report the current phase's navigation instead.
    pub async fn activate(&self, params: &CallbackParams) -> Navigation {
        // Only the first activation runs the flow; it claims the latch
        // before consuming the pending link or touching the network
        if self
            .activated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return self.phase().navigation();
        }

        let Some(code) = params.code.as_deref() else {
            let reason = match params.error {
                Some(ref e) => FailureReason::ProviderDenied(e.clone()),
                None => FailureReason::MissingCode,
            };
            return self.fail(reason);
        };

        let Some(token) = self.session.token() else {
            return self.fail(FailureReason::NoSession);
        };

        if let Err(reason) = self.check_state(params) {
            return self.fail(reason);
        }

        self.set_phase(CallbackPhase::Exchanging);
        info!(provider = %self.provider, "Exchanging authorization code");

        match self.api.exchange_code(&token, self.provider, code).await {
            Ok(_) => {
                info!(provider = %self.provider, "Account linked");
                self.set_phase(CallbackPhase::Linked);
                self.phase().navigation()
            }
            Err(e) => {
                error!(provider = %self.provider, error = %e, "Code exchange failed");
                self.fail(FailureReason::ExchangeFailed(e.to_string()))
            }
        }
    }
}
