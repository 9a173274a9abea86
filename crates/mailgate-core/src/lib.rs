//! Core library for mailgate.
//!
//! Session gating, OAuth account linking and the backend API client used
//! by the `mailgate` front-end.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod mailbox;
pub mod models;
pub mod oauth;
pub mod routes;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthService, SessionContext, SessionCredential};
pub use config::Config;
pub use guard::{AuthState, GuardActivation, SessionGuard};
pub use mailbox::{AccountError, Mailbox, PrimaryChange};
pub use oauth::{CallbackHandler, CallbackParams, CallbackPhase, OAuthProvider, PendingLinks};
pub use routes::{Navigation, Route};
pub use store::StateDir;
