use serde::{Deserialize, Serialize};

/// Mail provider behind a linked account.
///
/// The backend reports this as a lowercase tag. Tags this client does not
/// recognise decode as `Unknown` rather than failing the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gmail,
    Outlook,
    Other,
    #[serde(other)]
    Unknown,
}

impl Provider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Gmail => "Gmail",
            Provider::Outlook => "Outlook",
            Provider::Other => "Other",
            Provider::Unknown => "Unknown",
        }
    }

    /// Parse a user-supplied provider name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gmail" | "google" => Some(Provider::Gmail),
            "outlook" | "microsoft" | "office365" => Some(Provider::Outlook),
            "other" => Some(Provider::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An external mail account linked to the current user, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub address: String,
    #[serde(rename = "type", default = "unknown_provider")]
    pub provider: Provider,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
}

fn unknown_provider() -> Provider {
    Provider::Unknown
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkedAccountsResponse {
    #[serde(default)]
    pub emails: Vec<LinkedAccount>,
}

/// The account the backend flags as primary, if any.
///
/// The backend guarantees at most one; this only reads that flag.
pub fn primary_account(accounts: &[LinkedAccount]) -> Option<&LinkedAccount> {
    accounts.iter().find(|a| a.is_primary)
}
