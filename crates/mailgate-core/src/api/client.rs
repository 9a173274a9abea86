//! API client for the mailgate backend.
//!
//! Every call is a single request: there is no retry or backoff. Failed
//! calls surface as an `ApiError` wrapped in `anyhow`, so callers that
//! need the status class can downcast.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{InboxMessage, InboxResponse, LinkedAccount, LinkedAccountsResponse, OutgoingEmail};
use crate::oauth::OAuthProvider;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

const PROFILE_PATH: &str = "/auth/profile";
const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const ACCOUNTS_PATH: &str = "/email";
const DELETE_ACCOUNT_PATH: &str = "/email/delete";
const SET_PRIMARY_PATH: &str = "/email/set-primary";
const INBOX_PATH: &str = "/email/inbox";
const SEND_PATH: &str = "/email/send";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CodeExchangeRequest<'a> {
    code: &'a str,
}

#[derive(Debug, Serialize)]
struct AccountRequest<'a> {
    email: &'a str,
}

/// API client for the mailgate backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T> {
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e)).into()
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T> {
        let response = self.send_json(reqwest::Method::POST, path, token, body).await?;
        Self::parse_json(response, &self.url(path)).await
    }

    async fn send_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Self::check_response(response).await
    }

    // ===== Authentication =====

    /// Confirm a bearer token with the backend identity endpoint
    pub async fn verify_session(&self, token: &str) -> Result<()> {
        let url = self.url(PROFILE_PATH);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        Self::check_response(response).await?;
        debug!("Session verified");
        Ok(())
    }

    /// Exchange email and password for an access token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let response: LoginResponse = self
            .post(LOGIN_PATH, None, &LoginRequest { email, password })
            .await?;
        Ok(response.access_token)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        self.send_json(
            reqwest::Method::POST,
            REGISTER_PATH,
            None,
            &RegisterRequest {
                name,
                email,
                password,
            },
        )
        .await?;
        Ok(())
    }

    /// Hand a provider authorization code to the backend so it can link the account.
    ///
    /// The backend answers with JSON on success; a success status with a body
    /// that is not JSON is treated as a failure.
    pub async fn exchange_code(
        &self,
        token: &str,
        provider: OAuthProvider,
        code: &str,
    ) -> Result<serde_json::Value> {
        self.post(provider.callback_endpoint(), Some(token), &CodeExchangeRequest { code })
            .await
    }

    // ===== Linked accounts =====

    pub async fn linked_accounts(&self, token: &str) -> Result<Vec<LinkedAccount>> {
        let response: LinkedAccountsResponse = self.get(ACCOUNTS_PATH, token).await?;
        Ok(response.emails)
    }

    pub async fn delete_account(&self, token: &str, address: &str) -> Result<()> {
        self.send_json(
            reqwest::Method::DELETE,
            DELETE_ACCOUNT_PATH,
            Some(token),
            &AccountRequest { email: address },
        )
        .await?;
        Ok(())
    }

    pub async fn set_primary_account(&self, token: &str, address: &str) -> Result<()> {
        self.send_json(
            reqwest::Method::POST,
            SET_PRIMARY_PATH,
            Some(token),
            &AccountRequest { email: address },
        )
        .await?;
        Ok(())
    }

    // ===== Mail =====

    pub async fn inbox(&self, token: &str) -> Result<Vec<InboxMessage>> {
        let response: InboxResponse = self.get(INBOX_PATH, token).await?;
        debug!(count = response.data.len(), "Inbox fetched");
        Ok(response.data)
    }

    pub async fn send_email(&self, token: &str, email: &OutgoingEmail) -> Result<()> {
        self.send_json(reqwest::Method::POST, SEND_PATH, Some(token), email)
            .await?;
        Ok(())
    }
}
