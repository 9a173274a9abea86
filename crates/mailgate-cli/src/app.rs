//! Command handlers for the mailgate CLI.
//!
//! Every command that touches the user's mail passes through the session
//! guard first. Flow outcomes come back from the core as `Navigation`
//! values; here they are turned into terminal output.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use mailgate_core::auth::CredentialStore;
use mailgate_core::models::{filter_and_sort, primary_account, InboxSort, OutgoingEmail, Provider};
use mailgate_core::oauth::{AuthorizationRequest, LinkError, PendingLink};
use mailgate_core::utils::{format_date, truncate};
use mailgate_core::{
    ApiClient, AuthService, CallbackHandler, CallbackParams, CallbackPhase, Config, Mailbox, Navigation,
    OAuthProvider, PendingLinks, PrimaryChange, Route, SessionContext, SessionGuard, StateDir,
};
use tracing::{debug, warn};

// ============================================================================
// Constants
// ============================================================================

/// Column widths for the inbox listing
const SENDER_WIDTH: usize = 24;
const SUBJECT_WIDTH: usize = 48;

const NOT_SIGNED_IN: &str = "Not signed in or session expired. Run `mailgate login` first.";

pub struct App {
    config: Config,
    api: ApiClient,
    session: SessionContext,
    pending: PendingLinks,
}

impl App {
    /// Load config and persisted state
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(api_url = %config.api_url, "Config loaded");

        let state = StateDir::new(config.state_dir()?)?;
        debug!(dir = %state.path().display(), "State directory configured");

        let session = SessionContext::load(state.clone())?;
        let pending = PendingLinks::load(state)?;
        let api = ApiClient::new(&config.api_url)?;

        Ok(Self {
            config,
            api,
            session,
            pending,
        })
    }

    fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone(), self.session.clone())
    }

    fn guard(&self) -> SessionGuard {
        SessionGuard::new(self.api.clone(), self.session.clone())
    }

    fn mailbox(&self) -> Mailbox {
        Mailbox::new(self.api.clone(), self.session.clone())
    }

    /// Gate a protected command on a freshly verified session
    async fn require_session(&self) -> Result<()> {
        let activation = self.guard().activate().await;
        match activation.navigation() {
            Navigation::Render => Ok(()),
            Navigation::Redirect(_) | Navigation::Pending => bail!(NOT_SIGNED_IN),
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, email: Option<String>, remember: bool) -> Result<()> {
        let email = match email.filter(|e| !e.trim().is_empty()) {
            Some(e) => e.trim().to_string(),
            None => prompt_email(self.config.last_email.as_deref())?,
        };

        let password = if CredentialStore::has_credentials(&email) {
            if confirm("Use stored password? [Y/n]: ")? {
                CredentialStore::get_password(&email)?
            } else {
                prompt_password("Password: ")?
            }
        } else {
            prompt_password("Password: ")?
        };

        println!("Signing in...");
        let credential = self.auth().login(&email, &password).await?;

        if remember {
            if let Err(e) = CredentialStore::store(&email, &password) {
                warn!(error = %e, "Failed to store credentials");
            }
        }

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!(
            "Welcome, {}. Session valid until {}.",
            credential.display_name(),
            credential.expires_at().format("%Y-%m-%d %H:%M UTC")
        );
        Ok(())
    }

    pub async fn register(&self, name: &str, email: &str) -> Result<()> {
        let password = prompt_password("Password: ")?;
        let confirmation = prompt_password("Confirm password: ")?;
        if password != confirmation {
            bail!("Passwords do not match");
        }

        self.auth().register(name, email, &password).await?;
        println!("Account created. Run `mailgate login {}` to sign in.", email);
        Ok(())
    }

    pub fn logout(&self, forget: bool) -> Result<()> {
        if forget {
            if let Some(ref email) = self.config.last_email {
                CredentialStore::delete(email)?;
            }
        }
        let next = self.auth().logout();
        println!("Signed out.");
        debug!(route = %route_of(next), "Logout navigation");
        Ok(())
    }

    pub async fn status(&self) -> Result<()> {
        let Some(credential) = self.session.read() else {
            println!("Not signed in.");
            return Ok(());
        };

        let guard = self.guard();
        let mailbox = self.mailbox();
        let (activation, accounts) = futures::join!(guard.activate(), mailbox.linked_accounts());

        if !activation.is_authenticated() {
            println!("Stored session was rejected by the backend. Run `mailgate login`.");
            return Ok(());
        }

        println!("Signed in as {}", credential.display_name());
        println!(
            "Session expires {}",
            credential.expires_at().format("%Y-%m-%d %H:%M UTC")
        );
        debug!(cookie = %credential.to_cookie_string(), "Session credential");

        match accounts {
            Ok(accounts) => {
                println!("Linked accounts: {}", accounts.len());
                print_primary(primary_account(&accounts).map(|a| a.address.as_str()));
            }
            Err(e) => warn!(error = %e, "Failed to load linked accounts"),
        }
        Ok(())
    }

    // =========================================================================
    // Account linking
    // =========================================================================

    pub async fn link(&self, provider: &str) -> Result<()> {
        let provider = Provider::parse(provider)
            .with_context(|| format!("Unknown provider: {}", provider))?;
        let provider = OAuthProvider::try_from(provider)?;

        self.require_session().await?;

        let client_id = self
            .config
            .client_id(provider)
            .ok_or(LinkError::MissingClientId(provider))?;
        let request = AuthorizationRequest::new(provider, client_id, &self.config.app_url)?;
        self.pending.record(PendingLink::from(&request))?;

        println!("Open this URL to grant access to your {} account:\n", provider);
        println!("  {}\n", request.url);
        println!("When the browser lands on {}, run:", provider.callback_route());
        println!("  mailgate callback '<redirect URL>'");
        Ok(())
    }

    pub async fn callback(&self, url: &str) -> Result<()> {
        let (provider, params) = CallbackParams::from_redirect_url(url)?;

        // The callback route is protected
        self.require_session().await?;

        let handler = CallbackHandler::new(
            provider,
            self.api.clone(),
            self.session.clone(),
            self.pending.clone(),
        );
        match handler.activate(&params).await {
            Navigation::Redirect(Route::Home) => {
                println!("{} account linked.", handler.provider());
                Ok(())
            }
            next => bail!(
                "Could not link {} account ({}). Sign in again and retry with a new link.",
                provider,
                match handler.phase() {
                    CallbackPhase::Failed(reason) => reason.to_string(),
                    _ => format!("ended at {}", route_of(next)),
                }
            ),
        }
    }

    // =========================================================================
    // Linked accounts
    // =========================================================================

    pub async fn list_accounts(&self) -> Result<()> {
        self.require_session().await?;
        let accounts = self.mailbox().linked_accounts().await?;

        if accounts.is_empty() {
            println!("No linked accounts. Use `mailgate link gmail` or `mailgate link outlook`.");
            return Ok(());
        }
        for account in &accounts {
            let marker = if account.is_primary { " (primary)" } else { "" };
            println!("{:<8} {}{}", account.provider.display_name(), account.address, marker);
        }
        println!();
        print_primary(primary_account(&accounts).map(|a| a.address.as_str()));
        Ok(())
    }

    pub async fn delete_account(&self, email: &str) -> Result<()> {
        self.require_session().await?;
        self.mailbox().remove_account(email).await?;
        println!("Removed {}.", email);
        Ok(())
    }

    pub async fn set_primary(&self, email: &str) -> Result<()> {
        self.require_session().await?;
        match self.mailbox().set_primary(email).await? {
            PrimaryChange::Changed => println!("{} is now the primary account.", email),
            PrimaryChange::AlreadyPrimary => println!("{} is already the primary account.", email),
        }
        Ok(())
    }

    // =========================================================================
    // Mail
    // =========================================================================

    pub async fn inbox(&self, search: Option<&str>, sort: &str, limit: usize) -> Result<()> {
        let sort = InboxSort::parse(sort)
            .with_context(|| format!("Unknown sort order: {} (use date or sender)", sort))?;

        self.require_session().await?;
        let messages = self.mailbox().inbox().await?;
        let list = filter_and_sort(&messages, search.unwrap_or("").trim(), sort);

        if list.is_empty() {
            println!("No messages.");
            return Ok(());
        }
        for message in list.iter().take(limit) {
            let sender = if message.sender_name().is_empty() {
                message.sender_address()
            } else {
                message.sender_name()
            };
            println!(
                "{:<18}  {:<sw$}  {}",
                format_date(&message.received_date_time),
                truncate(sender, SENDER_WIDTH),
                truncate(&message.subject, SUBJECT_WIDTH),
                sw = SENDER_WIDTH
            );
        }
        if list.len() > limit {
            println!("... {} more", list.len() - limit);
        }
        Ok(())
    }

    pub async fn send(&self, to: String, subject: String, body: String) -> Result<()> {
        self.require_session().await?;
        let email = OutgoingEmail { to, subject, body };
        self.mailbox()
            .send(&email)
            .await
            .context("Error sending email")?;
        println!("Email sent to {}.", email.to);
        Ok(())
    }
}

fn route_of(navigation: Navigation) -> String {
    match navigation {
        Navigation::Redirect(route) => route.to_string(),
        Navigation::Render => "render".to_string(),
        Navigation::Pending => "pending".to_string(),
    }
}

fn print_primary(address: Option<&str>) {
    match address {
        Some(address) => println!("Primary: {}", address),
        None => println!("No primary email set"),
    }
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), last) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt)?;
    Ok(password)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase() != "n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_of() {
        assert_eq!(route_of(Navigation::Redirect(Route::Home)), "/home");
        assert_eq!(route_of(Navigation::Redirect(Route::Auth)), "/auth");
        assert_eq!(route_of(Navigation::Pending), "pending");
    }
}
