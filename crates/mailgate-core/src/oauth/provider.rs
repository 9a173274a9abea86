use rand::{distributions::Alphanumeric, Rng};
use reqwest::Url;
use thiserror::Error;

use crate::models::Provider;
use crate::routes::Route;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_SCOPES: &str = "https://mail.google.com openid email";

const MICROSOFT_AUTH_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
const MICROSOFT_SCOPES: &str = "openid profile offline_access Mail.Read Mail.ReadWrite Mail.Send";

/// Length of the random `state` nonce
const STATE_NONCE_LENGTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("{0} accounts cannot be linked through OAuth")]
    UnsupportedProvider(Provider),

    #[error("No OAuth client id configured for {0}")]
    MissingClientId(OAuthProvider),

    #[error("Invalid application URL: {0}")]
    InvalidAppUrl(String),

    #[error("Redirect URL does not point at an OAuth callback: {0}")]
    NotACallback(String),
}

/// Providers whose accounts are linked by a three-legged OAuth handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Gmail,
    Outlook,
}

impl OAuthProvider {
    /// Client route the provider redirects back to
    pub fn callback_route(&self) -> Route {
        match self {
            OAuthProvider::Gmail => Route::GmailCallback,
            OAuthProvider::Outlook => Route::OutlookCallback,
        }
    }

    /// Backend endpoint that accepts the authorization code
    pub fn callback_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Gmail => "/auth/callback",
            OAuthProvider::Outlook => "/auth/outlook",
        }
    }

    pub fn from_route(route: Route) -> Option<Self> {
        match route {
            Route::GmailCallback => Some(OAuthProvider::Gmail),
            Route::OutlookCallback => Some(OAuthProvider::Outlook),
            Route::Index | Route::Auth | Route::Home | Route::Profile => None,
        }
    }

    fn authorize_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Gmail => GOOGLE_AUTH_URL,
            OAuthProvider::Outlook => MICROSOFT_AUTH_URL,
        }
    }

    fn scopes(&self) -> &'static str {
        match self {
            OAuthProvider::Gmail => GOOGLE_SCOPES,
            OAuthProvider::Outlook => MICROSOFT_SCOPES,
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&Provider::from(*self), f)
    }
}

impl From<OAuthProvider> for Provider {
    fn from(p: OAuthProvider) -> Self {
        match p {
            OAuthProvider::Gmail => Provider::Gmail,
            OAuthProvider::Outlook => Provider::Outlook,
        }
    }
}

impl TryFrom<Provider> for OAuthProvider {
    type Error = LinkError;

    fn try_from(p: Provider) -> Result<Self, Self::Error> {
        match p {
            Provider::Gmail => Ok(OAuthProvider::Gmail),
            Provider::Outlook => Ok(OAuthProvider::Outlook),
            Provider::Other | Provider::Unknown => Err(LinkError::UnsupportedProvider(p)),
        }
    }
}

/// A consent-screen URL together with the nonce it carries
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub provider: OAuthProvider,
    pub url: Url,
    pub state: String,
}

impl AuthorizationRequest {
    pub fn new(provider: OAuthProvider, client_id: &str, app_base_url: &str) -> Result<Self, LinkError> {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_NONCE_LENGTH)
            .map(char::from)
            .collect();
        Self::with_state(provider, client_id, app_base_url, state)
    }

    pub fn with_state(
        provider: OAuthProvider,
        client_id: &str,
        app_base_url: &str,
        state: String,
    ) -> Result<Self, LinkError> {
        if client_id.trim().is_empty() {
            return Err(LinkError::MissingClientId(provider));
        }
        let redirect_uri = redirect_uri(provider, app_base_url)?;

        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", client_id),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", provider.scopes()),
        ];
        match provider {
            OAuthProvider::Gmail => {
                params.push(("access_type", "offline"));
                params.push(("prompt", "consent"));
            }
            OAuthProvider::Outlook => {
                params.push(("response_mode", "query"));
            }
        }
        params.push(("state", state.as_str()));

        let url = Url::parse_with_params(provider.authorize_endpoint(), &params)
            .map_err(|e| LinkError::InvalidAppUrl(e.to_string()))?;

        Ok(Self {
            provider,
            url,
            state,
        })
    }
}

/// Redirect URI registered with the provider for this client
pub fn redirect_uri(provider: OAuthProvider, app_base_url: &str) -> Result<Url, LinkError> {
    let base = Url::parse(app_base_url).map_err(|_| LinkError::InvalidAppUrl(app_base_url.to_string()))?;
    base.join(provider.callback_route().path())
        .map_err(|_| LinkError::InvalidAppUrl(app_base_url.to_string()))
}
