use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Token pair issued on sign-in
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionTokens {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Credential produced by the interactive (popup) sign-in step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpCredential {
    /// Identity provider, e.g. "google.com"
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    pub id_token: String,
}

fn default_provider_id() -> String {
    "google.com".to_string()
}

/// Session state published to subscribers
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SessionState {
    /// Whether the initial auth check has completed
    pub resolved: bool,
    pub identity: Option<UserIdentity>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.uid.as_str())
    }
}
