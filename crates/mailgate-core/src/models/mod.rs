//! Data models for backend entities.
//!
//! - `LinkedAccount`, `Provider`: external mail accounts attached to the user
//! - `InboxMessage`, `InboxSort`: received mail and its list ordering
//! - `OutgoingEmail`: a message submitted for sending

pub mod account;
pub mod message;

pub use account::{primary_account, LinkedAccount, LinkedAccountsResponse, Provider};
pub use message::{
    filter_and_sort, EmailAddress, InboxMessage, InboxResponse, InboxSort, OutgoingEmail, Sender,
};
