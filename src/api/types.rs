use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::approval::ApprovalKind;
use crate::storage::StoredCredentials;

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub private_key: String,
    #[serde(default)]
    pub kind: ApprovalKind,
}

#[derive(Debug, Deserialize)]
pub struct SaveCredentialsRequest {
    pub api_user: String,
    pub api_secret: String,
}

/// Saved API user and whether a session token is cached; never the secret
#[derive(Debug, Serialize)]
pub struct CredentialsResponse {
    pub api_user: Option<String>,
    pub has_token: bool,
}

impl From<StoredCredentials> for CredentialsResponse {
    fn from(stored: StoredCredentials) -> Self {
        Self {
            has_token: stored.auth_token.is_some(),
            api_user: stored.api_user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmSettlementResponse {
    pub settlement_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DiscardSettlementResponse {
    pub settlement_id: Uuid,
    pub discarded: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refresh_key: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: String,
    pub refresh_key: u64,
}
