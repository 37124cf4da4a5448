//! Data model for the local credential cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub api_user: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    pub fn has_api_key(&self) -> bool {
        matches!((&self.api_user, &self.api_secret), (Some(u), Some(s)) if !u.is_empty() && !s.is_empty())
    }
}
