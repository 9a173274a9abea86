//! Session guard for protected views.
//!
//! Every activation starts `Unknown` and resolves exactly once. A missing
//! credential resolves `Unauthenticated` without touching the network;
//! otherwise one identity check decides. Nothing is cached between
//! activations, so two protected views mounted together verify twice.

use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::SessionContext;
use crate::routes::{Navigation, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// One pass of a protected view through the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardActivation {
    state: AuthState,
}

impl GuardActivation {
    fn new() -> Self {
        Self {
            state: AuthState::Unknown,
        }
    }

    /// Settle the state. A resolved activation never changes again.
    fn resolve(&mut self, state: AuthState) {
        if self.state == AuthState::Unknown {
            self.state = state;
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn navigation(&self) -> Navigation {
        match self.state {
            AuthState::Unknown => Navigation::Pending,
            AuthState::Authenticated => Navigation::Render,
            AuthState::Unauthenticated => Navigation::Redirect(Route::Auth),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionGuard {
    api: ApiClient,
    session: SessionContext,
}

impl SessionGuard {
    pub fn new(api: ApiClient, session: SessionContext) -> Self {
        Self { api, session }
    }

    /// Start an activation in the `Unknown` state
    pub fn begin(&self) -> GuardActivation {
        GuardActivation::new()
    }

    /// Resolve an activation. Already-resolved activations are returned as-is.
    pub async fn verify(&self, activation: &mut GuardActivation) -> AuthState {
        if activation.state != AuthState::Unknown {
            return activation.state;
        }

        let Some(token) = self.session.token() else {
            debug!("No session credential, skipping verification");
            activation.resolve(AuthState::Unauthenticated);
            return activation.state;
        };

        let state = match self.api.verify_session(&token).await {
            Ok(()) => AuthState::Authenticated,
            Err(e) => {
                match e.downcast_ref::<ApiError>() {
                    Some(api_err) if api_err.is_auth_failure() => {
                        debug!(error = %e, "Session rejected by backend");
                    }
                    _ => warn!(error = %e, "Session verification failed"),
                }
                AuthState::Unauthenticated
            }
        };

        activation.resolve(state);
        activation.state
    }

    /// Run a fresh activation to completion
    pub async fn activate(&self) -> GuardActivation {
        let mut activation = self.begin();
        self.verify(&mut activation).await;
        activation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_renders_placeholder() {
        let activation = GuardActivation::new();
        assert_eq!(activation.state(), AuthState::Unknown);
        assert_eq!(activation.navigation(), Navigation::Pending);
    }

    #[test]
    fn test_resolved_state_never_changes() {
        let mut activation = GuardActivation::new();
        activation.resolve(AuthState::Authenticated);
        activation.resolve(AuthState::Unauthenticated);
        activation.resolve(AuthState::Unknown);
        assert_eq!(activation.state(), AuthState::Authenticated);
        assert_eq!(activation.navigation(), Navigation::Render);
    }

    #[test]
    fn test_unauthenticated_redirects_to_auth() {
        let mut activation = GuardActivation::new();
        activation.resolve(AuthState::Unauthenticated);
        assert_eq!(activation.navigation(), Navigation::Redirect(Route::Auth));
        assert!(!activation.is_authenticated());
    }

    #[tokio::test]
    async fn test_no_credential_resolves_without_network() {
        // Port 9 is discard; nothing should ever be sent there
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let guard = SessionGuard::new(api, SessionContext::ephemeral());
        let activation = guard.activate().await;
        assert_eq!(activation.state(), AuthState::Unauthenticated);
    }
}
