/// Records held by the mock backend
///
/// Field names match the custody API so records serialize straight into
/// response bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockPledge {
    pub id: String,
    pub account_id: String,
    pub amount: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockAccount {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockRequest {
    pub id: String,
    pub target_id: String,
    pub target_type: String,
    pub status: String,
    pub created_on: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockChallengeData {
    pub account_name: String,
    pub amount: String,
    pub currency: String,
    pub exchange: String,
    pub timestamp: String,
    pub total_pledge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockChallenge {
    #[serde(rename = "type")]
    pub kind: String,
    pub antireplay: String,
    pub data: MockChallengeData,
}

/// Query string of `/list-pending-requests`
#[derive(Debug, Clone, Deserialize)]
pub struct PendingQuery {
    #[serde(rename = "type")]
    pub request_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateBody {
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveBody {
    pub private_key: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub pledges: usize,
}
