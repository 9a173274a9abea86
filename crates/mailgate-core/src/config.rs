//! Application configuration management.
//!
//! Holds the backend and front-end base URLs, the OAuth client ids and the
//! last email used to sign in. Stored at `~/.config/mailgate/config.json`;
//! `MAILGATE_*` environment variables override the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::oauth::OAuthProvider;

/// Application name used for config/state directory paths
const APP_NAME: &str = "mailgate";

const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_APP_URL: &str = "http://localhost:5173";

pub const ENV_API_URL: &str = "MAILGATE_API_URL";
pub const ENV_APP_URL: &str = "MAILGATE_APP_URL";
pub const ENV_GOOGLE_CLIENT_ID: &str = "MAILGATE_GOOGLE_CLIENT_ID";
pub const ENV_MICROSOFT_CLIENT_ID: &str = "MAILGATE_MICROSOFT_CLIENT_ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Base URL the OAuth providers redirect back to
    #[serde(default = "default_app_url")]
    pub app_url: String,
    #[serde(default)]
    pub google_client_id: Option<String>,
    #[serde(default)]
    pub microsoft_client_id: Option<String>,
    #[serde(default)]
    pub last_email: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_app_url() -> String {
    DEFAULT_APP_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            app_url: default_app_url(),
            google_client_id: None,
            microsoft_client_id: None,
            last_email: None,
        }
    }
}

impl Config {
    /// Load from disk and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_API_URL) {
            debug!(api_url = %v, "API URL overridden from environment");
            self.api_url = v;
        }
        if let Some(v) = get(ENV_APP_URL) {
            self.app_url = v;
        }
        if let Some(v) = get(ENV_GOOGLE_CLIENT_ID) {
            self.google_client_id = Some(v);
        }
        if let Some(v) = get(ENV_MICROSOFT_CLIENT_ID) {
            self.microsoft_client_id = Some(v);
        }
    }

    pub fn client_id(&self, provider: OAuthProvider) -> Option<&str> {
        match provider {
            OAuthProvider::Gmail => self.google_client_id.as_deref(),
            OAuthProvider::Outlook => self.microsoft_client_id.as_deref(),
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session record and other client state
    pub fn state_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
