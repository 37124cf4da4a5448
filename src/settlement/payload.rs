//! Settlement payload assembly

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{
    FeesStrategy, SettlementPayload, TransactionData, TransactionIntent, ETHEREUM_LIKE_SEND,
};

pub const OUTBOUND_DEFAULT_CURRENCY: &str = "ethereum";
pub const INBOUND_DEFAULT_CURRENCY: &str = "ethereum_holesky";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementKind {
    Outbound,
    Inbound,
}

/// Operator input for a settlement leaving the pledge's account
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundRequest {
    pub pledge_id: String,
    pub recipient_address: String,
    /// Amount in ETH, e.g. `"1.25"`
    pub amount_eth: String,
}

/// Operator input for a settlement into an explicit destination account
#[derive(Debug, Clone, Deserialize)]
pub struct InboundRequest {
    pub pledge_id: String,
    pub to_account_id: String,
    pub to_address: String,
    /// Amount in ETH, e.g. `"1.25"`
    pub amount_eth: String,
}

/// Everything resolved from the backend before a payload can be built
#[derive(Debug, Clone)]
pub struct ResolvedSettlement {
    pub settlement_id: Uuid,
    pub pledge_id: String,
    pub account_id: String,
    pub account_name: String,
    pub currency: String,
    pub amount_wei: String,
    pub recipient: String,
    pub max_fees: String,
}

impl ResolvedSettlement {
    fn transaction_data(&self) -> TransactionData {
        TransactionData {
            account_name: self.account_name.clone(),
            amount: self.amount_wei.clone(),
            currency: self.currency.clone(),
            max_fees: self.max_fees.clone(),
            recipient: self.recipient.clone(),
        }
    }
}

pub fn outbound_payload(resolved: &ResolvedSettlement) -> SettlementPayload {
    SettlementPayload {
        id: resolved.settlement_id,
        from_pledge_id: resolved.pledge_id.clone(),
        to_account_id: None,
        meta: serde_json::Map::new(),
        outbound_transaction_intent: Some(TransactionIntent {
            account_id: resolved.account_id.clone(),
            fees_strategy: Some(FeesStrategy::fast()),
            transaction_data: resolved.transaction_data(),
            transaction_type: ETHEREUM_LIKE_SEND.to_string(),
        }),
        inbound_transaction_intent: None,
    }
}

pub fn inbound_payload(resolved: &ResolvedSettlement) -> SettlementPayload {
    SettlementPayload {
        id: resolved.settlement_id,
        from_pledge_id: resolved.pledge_id.clone(),
        to_account_id: Some(resolved.account_id.clone()),
        meta: serde_json::Map::new(),
        outbound_transaction_intent: None,
        inbound_transaction_intent: Some(TransactionIntent {
            account_id: resolved.account_id.clone(),
            fees_strategy: None,
            transaction_data: resolved.transaction_data(),
            transaction_type: ETHEREUM_LIKE_SEND.to_string(),
        }),
    }
}
