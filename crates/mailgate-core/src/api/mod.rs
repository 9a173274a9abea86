//! REST client for the mailgate backend.
//!
//! All authenticated endpoints take the session's bearer token explicitly;
//! the client itself holds no credential.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
