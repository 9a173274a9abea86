//! Authentication: session credential ownership and login flows.
//!
//! - `SessionContext`: the single owner of the bearer credential, injected
//!   into every component that talks to the backend
//! - `AuthService`: login, registration and logout
//! - `CredentialStore`: optional remembered passwords in the OS keychain
//!
//! Credentials expire 7 days after issuance.

pub mod credentials;
pub mod login;
pub mod session;

pub use credentials::CredentialStore;
pub use login::{AuthError, AuthService};
pub use session::{CookieAttributes, SameSite, SessionContext, SessionCredential, TokenClaims};
