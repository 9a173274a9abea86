use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::routes::{Navigation, Route};

use super::{SessionContext, SessionCredential};

/// Failures shown inline on the login and registration forms
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Email and password required")]
    MissingFields,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Registration failed")]
    RegistrationFailed,

    #[error("Could not save session: {0}")]
    Storage(String),
}

/// Login, registration and logout against the backend
#[derive(Clone, Debug)]
pub struct AuthService {
    api: ApiClient,
    session: SessionContext,
}

impl AuthService {
    pub fn new(api: ApiClient, session: SessionContext) -> Self {
        Self { api, session }
    }

    /// Authenticate and store a fresh session credential
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionCredential, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let token = match self.api.login(email.trim(), password).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let credential = SessionCredential::issue(token);
        self.session
            .write(credential.clone())
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        info!(expires_at = %credential.expires_at(), "Login successful");
        Ok(credential)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        match self.api.register(name.trim(), email.trim(), password).await {
            Ok(()) => {
                info!("Registration successful");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                Err(AuthError::RegistrationFailed)
            }
        }
    }

    /// Drop the session and send the caller back to the login entry point
    pub fn logout(&self) -> Navigation {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to remove persisted session");
        }
        info!("Logged out");
        Navigation::Redirect(Route::Auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        AuthService::new(api, SessionContext::ephemeral())
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let svc = service();
        assert_eq!(svc.login("", "pw").await.unwrap_err(), AuthError::MissingFields);
        assert_eq!(svc.login("a@b.c", "").await.unwrap_err(), AuthError::MissingFields);
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let svc = service();
        assert_eq!(
            svc.register("Ana", "  ", "pw").await.unwrap_err(),
            AuthError::MissingFields
        );
    }

    #[test]
    fn test_logout_clears_session() {
        let session = SessionContext::ephemeral();
        session.write(SessionCredential::issue("abc123")).unwrap();
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let svc = AuthService::new(api, session.clone());

        assert_eq!(svc.logout(), Navigation::Redirect(Route::Auth));
        assert!(session.read().is_none());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(AuthError::RegistrationFailed.to_string(), "Registration failed");
    }
}
