//! Linked-account management and mail operations for the signed-in user.

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::auth::SessionContext;
use crate::models::{primary_account, InboxMessage, LinkedAccount, OutgoingEmail};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("{0} is not a linked account")]
    NotLinked(String),

    #[error("The primary account {0} cannot be removed")]
    PrimaryCannotBeDeleted(String),

    #[error("Recipient, subject and body are required")]
    IncompleteMessage,
}

/// Outcome of a set-primary request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryChange {
    Changed,
    AlreadyPrimary,
}

#[derive(Clone, Debug)]
pub struct Mailbox {
    api: ApiClient,
    session: SessionContext,
}

impl Mailbox {
    pub fn new(api: ApiClient, session: SessionContext) -> Self {
        Self { api, session }
    }

    fn token(&self) -> Result<String> {
        self.session
            .token()
            .ok_or_else(|| AccountError::NotSignedIn.into())
    }

    pub async fn linked_accounts(&self) -> Result<Vec<LinkedAccount>> {
        let token = self.token()?;
        let accounts = self.api.linked_accounts(&token).await?;
        debug!(count = accounts.len(), "Linked accounts fetched");
        Ok(accounts)
    }

    /// Unlink an account. The current primary account is refused locally.
    pub async fn remove_account(&self, address: &str) -> Result<()> {
        let token = self.token()?;
        let accounts = self.api.linked_accounts(&token).await?;
        let account = find_account(&accounts, address)?;
        if account.is_primary {
            return Err(AccountError::PrimaryCannotBeDeleted(account.address.clone()).into());
        }

        self.api.delete_account(&token, &account.address).await?;
        info!(address = %account.address, "Account removed");
        Ok(())
    }

    pub async fn set_primary(&self, address: &str) -> Result<PrimaryChange> {
        let token = self.token()?;
        let accounts = self.api.linked_accounts(&token).await?;
        let account = find_account(&accounts, address)?;
        if primary_account(&accounts).map(|p| p.address.as_str()) == Some(account.address.as_str()) {
            return Ok(PrimaryChange::AlreadyPrimary);
        }

        self.api.set_primary_account(&token, &account.address).await?;
        info!(address = %account.address, "Primary account changed");
        Ok(PrimaryChange::Changed)
    }

    pub async fn inbox(&self) -> Result<Vec<InboxMessage>> {
        let token = self.token()?;
        self.api.inbox(&token).await
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        if email.to.trim().is_empty() || email.subject.trim().is_empty() || email.body.trim().is_empty() {
            return Err(AccountError::IncompleteMessage.into());
        }
        let token = self.token()?;
        self.api.send_email(&token, email).await?;
        info!(to = %email.to, "Email sent");
        Ok(())
    }
}

fn find_account<'a>(accounts: &'a [LinkedAccount], address: &str) -> Result<&'a LinkedAccount> {
    accounts
        .iter()
        .find(|a| a.address.eq_ignore_ascii_case(address.trim()))
        .ok_or_else(|| AccountError::NotLinked(address.trim().to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    fn accounts() -> Vec<LinkedAccount> {
        vec![
            LinkedAccount {
                address: "ana@gmail.com".to_string(),
                provider: Provider::Gmail,
                is_primary: true,
            },
            LinkedAccount {
                address: "ana@outlook.com".to_string(),
                provider: Provider::Outlook,
                is_primary: false,
            },
        ]
    }

    #[test]
    fn test_find_account_ignores_case() {
        let list = accounts();
        assert_eq!(find_account(&list, " ANA@Outlook.com").unwrap().provider, Provider::Outlook);
        let err = find_account(&list, "bob@x.y").unwrap_err();
        assert_eq!(
            err.downcast_ref::<AccountError>(),
            Some(&AccountError::NotLinked("bob@x.y".to_string()))
        );
    }

    #[tokio::test]
    async fn test_operations_require_session() {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mailbox = Mailbox::new(api, SessionContext::ephemeral());
        let err = mailbox.inbox().await.unwrap_err();
        assert_eq!(err.downcast_ref::<AccountError>(), Some(&AccountError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_send_rejects_incomplete_message() {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mailbox = Mailbox::new(api, SessionContext::ephemeral());
        let email = OutgoingEmail {
            to: "bob@example.com".to_string(),
            subject: " ".to_string(),
            body: "hi".to_string(),
        };
        let err = mailbox.send(&email).await.unwrap_err();
        assert_eq!(err.downcast_ref::<AccountError>(), Some(&AccountError::IncompleteMessage));
    }
}
