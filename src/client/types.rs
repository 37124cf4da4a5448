// Backend API request/response types
//
// Every response carries `success`; `success: false` is an ordinary answer
// with an optional `error` string, not a transport failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const PLEDGE_INCREMENT_REQUEST: &str = "CREATE_PLEDGE_INCREMENT";
pub const SETTLEMENT_REQUEST: &str = "CREATE_TRANSACTION";
pub const PENDING_APPROVAL: &str = "PENDING_APPROVAL";
pub const ETHEREUM_LIKE_SEND: &str = "ETHEREUM_LIKE_SEND";

/// A list item as the backend sends it.
///
/// Some listings wrap each entry in a `{node, cursor}` envelope and some send
/// the entry flat. Both shapes collapse to `T` via [`Listed::into_inner`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listed<T> {
    Wrapped {
        node: T,
        #[serde(default)]
        cursor: Option<String>,
    },
    Flat(T),
}

impl<T> Listed<T> {
    pub fn into_inner(self) -> T {
        match self {
            Listed::Wrapped { node, .. } => node,
            Listed::Flat(item) => item,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pledge {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default, deserialize_with = "amount_string")]
    pub amount: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PledgeList {
    pub success: bool,
    #[serde(default)]
    pub pledges: Vec<Listed<Pledge>>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub has_next_page: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PledgeList {
    pub fn into_pledges(self) -> Vec<Pledge> {
        self.pledges.into_iter().map(Listed::into_inner).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PledgeResponse {
    pub success: bool,
    #[serde(default)]
    pub pledge: Option<Pledge>,
    #[serde(default)]
    pub error: Option<String>,
}

/// An approval-pending action against a pledge increment or a settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingRequest {
    pub id: String,
    #[serde(default)]
    pub target_id: String,
    #[serde(default)]
    pub pledge_id: Option<String>,
    #[serde(default)]
    pub target_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_on: Option<String>,
}

impl PendingRequest {
    /// The pledge this request points at: `target_id`, else `pledge_id`.
    pub fn pledge_target(&self) -> Option<&str> {
        if !self.target_id.is_empty() {
            return Some(&self.target_id);
        }
        self.pledge_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestList {
    pub success: bool,
    #[serde(default)]
    pub requests: Vec<Listed<PendingRequest>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RequestList {
    pub fn into_requests(self) -> Vec<PendingRequest> {
        self.requests.into_iter().map(Listed::into_inner).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub balance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    pub success: bool,
    #[serde(default)]
    pub account: Option<Account>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChallengeData {
    pub account_name: String,
    pub amount: String,
    pub currency: String,
    pub exchange: String,
    pub timestamp: String,
    pub total_pledge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodedChallenge {
    #[serde(rename = "type")]
    pub kind: String,
    pub antireplay: String,
    pub data: ChallengeData,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeEnvelope {
    pub decoded: DecodedChallenge,
    #[serde(default)]
    pub raw: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PledgeChallenge {
    pub success: bool,
    #[serde(default)]
    pub challenge: Option<ChallengeEnvelope>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApprovalRequest {
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalResponse {
    pub success: bool,
    #[serde(default)]
    pub pledge_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateRequest {
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthenticateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Settlement and fee estimation payloads
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeedData {
    pub speed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeesStrategy {
    pub data: SpeedData,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FeesStrategy {
    /// The only strategy the console uses: `{data: {speed: "FAST"}, type: "SPEED"}`.
    pub fn fast() -> Self {
        Self {
            data: SpeedData {
                speed: "FAST".to_string(),
            },
            kind: "SPEED".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionData {
    pub account_name: String,
    pub amount: String,
    pub currency: String,
    pub max_fees: String,
    pub recipient: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionIntent {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees_strategy: Option<FeesStrategy>,
    pub transaction_data: TransactionData,
    pub transaction_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementPayload {
    pub id: Uuid,
    pub from_pledge_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<String>,
    pub meta: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_transaction_intent: Option<TransactionIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_transaction_intent: Option<TransactionIntent>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSettlementResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeeEstimationData {
    pub account_id: String,
    pub fees_strategy: FeesStrategy,
    pub transaction_data: TransactionData,
    pub transaction_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub content: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeeEstimationRequest {
    pub data: FeeEstimationData,
    pub note: Note,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FeeEstimationRequest {
    /// Fee estimate for an Ethereum-like send; `max_fees` is always sent as "0".
    pub fn ethereum_like_send(
        account_id: &str,
        account_name: &str,
        amount_wei: &str,
        recipient: &str,
        currency: &str,
    ) -> Self {
        Self {
            data: FeeEstimationData {
                account_id: account_id.to_string(),
                fees_strategy: FeesStrategy::fast(),
                transaction_data: TransactionData {
                    account_name: account_name.to_string(),
                    amount: amount_wei.to_string(),
                    currency: currency.to_string(),
                    max_fees: "0".to_string(),
                    recipient: recipient.to_string(),
                },
                transaction_type: ETHEREUM_LIKE_SEND.to_string(),
            },
            note: Note {
                content: "null".to_string(),
                title: "null".to_string(),
            },
            kind: SETTLEMENT_REQUEST.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeeEstimation {
    #[serde(default)]
    pub max_fees: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeeEstimationResponse {
    pub success: bool,
    #[serde(default)]
    pub fee_estimation: Option<FeeEstimation>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Accepts an amount sent either as a string or as a JSON number.
fn amount_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("0".to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected amount as string or number, got {}",
            other
        ))),
    }
}
