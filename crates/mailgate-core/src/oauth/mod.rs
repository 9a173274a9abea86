//! OAuth account linking for Gmail and Outlook.
//!
//! Linking is a three-legged handshake: the client builds a consent URL
//! (`AuthorizationRequest`), the provider redirects back with a one-time
//! code, and `CallbackHandler` hands that code to the backend exactly once.

pub mod callback;
pub mod provider;
pub mod state;

pub use callback::{CallbackHandler, CallbackParams, CallbackPhase, FailureReason};
pub use provider::{redirect_uri, AuthorizationRequest, LinkError, OAuthProvider};
pub use state::{PendingLink, PendingLinks};
