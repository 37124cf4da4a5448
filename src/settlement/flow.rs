//! Settlement preparation and confirmation
//!
//! `Idle → Verifying → ReadyForConfirmation → Submitting → Done`
//!
//! Any failure while preparing drops the flow back to `Idle`. A failed
//! submission returns to `ReadyForConfirmation` with the payload intact so the
//! operator can resubmit. Nothing is retried automatically.

use serde::Serialize;
use uuid::Uuid;

use super::payload::*;
use crate::client::{ApiClient, FeeEstimationRequest, Pledge, SettlementPayload};
use crate::error::DashboardError;
use crate::units::eth_to_wei;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum SettlementStage {
    Idle,
    Verifying,
    ReadyForConfirmation,
    Submitting,
    Done { settlement_id: Uuid },
}

/// A verified settlement awaiting operator confirmation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementDraft {
    pub kind: SettlementKind,
    pub settlement_id: Uuid,
    pub account_name: String,
    pub amount_wei: String,
    pub max_fees: String,
    pub payload: SettlementPayload,
}

pub struct SettlementFlow {
    client: ApiClient,
    stage: SettlementStage,
    draft: Option<SettlementDraft>,
    last_error: Option<String>,
}

impl SettlementFlow {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            stage: SettlementStage::Idle,
            draft: None,
            last_error: None,
        }
    }

    pub fn stage(&self) -> &SettlementStage {
        &self.stage
    }

    pub fn draft(&self) -> Option<&SettlementDraft> {
        self.draft.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Verify the pledge and its owning account, estimate fees and build an
    /// outbound payload
    pub async fn prepare_outbound(
        &mut self,
        request: &OutboundRequest,
    ) -> Result<SettlementDraft, DashboardError> {
        self.ensure_can_prepare()?;
        require_fields(&[
            &request.pledge_id,
            &request.recipient_address,
            &request.amount_eth,
        ])?;
        let amount_wei = eth_to_wei(&request.amount_eth)?;

        self.enter_verifying();
        let result = self.resolve_outbound(request, amount_wei).await;
        self.finish_preparation(SettlementKind::Outbound, result)
    }

    /// Verify the pledge and the destination account, estimate fees and build
    /// an inbound payload
    pub async fn prepare_inbound(
        &mut self,
        request: &InboundRequest,
    ) -> Result<SettlementDraft, DashboardError> {
        self.ensure_can_prepare()?;
        require_fields(&[
            &request.pledge_id,
            &request.to_account_id,
            &request.to_address,
            &request.amount_eth,
        ])?;
        let amount_wei = eth_to_wei(&request.amount_eth)?;

        self.enter_verifying();
        let result = self.resolve_inbound(request, amount_wei).await;
        self.finish_preparation(SettlementKind::Inbound, result)
    }

    /// Submit the prepared payload verbatim
    pub async fn confirm(&mut self) -> Result<Uuid, DashboardError> {
        let draft = match (&self.stage, &self.draft) {
            (SettlementStage::ReadyForConfirmation, Some(draft)) => draft.clone(),
            _ => {
                return Err(DashboardError::InvalidState(
                    "No settlement data available".to_string(),
                ))
            }
        };

        self.stage = SettlementStage::Submitting;
        log::info!("Creating settlement {}", draft.settlement_id);

        let result = match self.client.create_settlement(&draft.payload).await {
            Ok(response) if response.success => Ok(draft.settlement_id),
            Ok(response) => Err(DashboardError::domain(
                "Failed to create settlement",
                response.error,
                "Unknown error",
            )),
            Err(e) => Err(DashboardError::from(e)),
        };

        match result {
            Ok(settlement_id) => {
                log::info!("Settlement created successfully: {}", settlement_id);
                self.stage = SettlementStage::Done { settlement_id };
                self.last_error = None;
                Ok(settlement_id)
            }
            Err(e) => {
                log::warn!("Settlement {} not created: {}", draft.settlement_id, e);
                self.stage = SettlementStage::ReadyForConfirmation;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn ensure_can_prepare(&self) -> Result<(), DashboardError> {
        match self.stage {
            SettlementStage::Verifying | SettlementStage::Submitting => Err(
                DashboardError::InvalidState("Settlement is already in progress".to_string()),
            ),
            _ => Ok(()),
        }
    }

    fn enter_verifying(&mut self) {
        self.stage = SettlementStage::Verifying;
        self.draft = None;
        self.last_error = None;
    }

    fn finish_preparation(
        &mut self,
        kind: SettlementKind,
        result: Result<ResolvedSettlement, DashboardError>,
    ) -> Result<SettlementDraft, DashboardError> {
        match result {
            Ok(resolved) => {
                let payload = match kind {
                    SettlementKind::Outbound => outbound_payload(&resolved),
                    SettlementKind::Inbound => inbound_payload(&resolved),
                };
                let draft = SettlementDraft {
                    kind,
                    settlement_id: resolved.settlement_id,
                    account_name: resolved.account_name,
                    amount_wei: resolved.amount_wei,
                    max_fees: resolved.max_fees,
                    payload,
                };
                self.stage = SettlementStage::ReadyForConfirmation;
                self.draft = Some(draft.clone());
                Ok(draft)
            }
            Err(e) => {
                log::warn!("Failed to prepare {:?} settlement: {}", kind, e);
                self.stage = SettlementStage::Idle;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn resolve_outbound(
        &self,
        request: &OutboundRequest,
        amount_wei: String,
    ) -> Result<ResolvedSettlement, DashboardError> {
        let pledge = self.fetch_pledge(&request.pledge_id).await?;
        let account_name = self.fetch_account_name(&pledge.account_id).await?;
        let currency = pledge
            .currency
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| OUTBOUND_DEFAULT_CURRENCY.to_string());

        let mut resolved = ResolvedSettlement {
            settlement_id: Uuid::new_v4(),
            pledge_id: request.pledge_id.clone(),
            account_id: pledge.account_id,
            account_name,
            currency,
            amount_wei,
            recipient: request.recipient_address.clone(),
            max_fees: "0".to_string(),
        };
        resolved.max_fees = self.estimate_max_fees(&resolved).await?;
        Ok(resolved)
    }

    async fn resolve_inbound(
        &self,
        request: &InboundRequest,
        amount_wei: String,
    ) -> Result<ResolvedSettlement, DashboardError> {
        let pledge = self.fetch_pledge(&request.pledge_id).await?;
        let account_name = self.fetch_account_name(&request.to_account_id).await?;
        let currency = pledge
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| INBOUND_DEFAULT_CURRENCY.to_string());

        let mut resolved = ResolvedSettlement {
            settlement_id: Uuid::new_v4(),
            pledge_id: request.pledge_id.clone(),
            account_id: request.to_account_id.clone(),
            account_name,
            currency,
            amount_wei,
            recipient: request.to_address.clone(),
            max_fees: "0".to_string(),
        };
        resolved.max_fees = self.estimate_max_fees(&resolved).await?;
        Ok(resolved)
    }

    async fn fetch_pledge(&self, pledge_id: &str) -> Result<Pledge, DashboardError> {
        let response = self.client.get_pledge(pledge_id).await?;
        if !response.success {
            return Err(DashboardError::domain(
                "Failed to verify pledge details",
                response.error,
                "Pledge not found",
            ));
        }
        response
            .pledge
            .ok_or_else(|| DashboardError::NotFound(format!("pledge {}", pledge_id)))
    }

    async fn fetch_account_name(&self, account_id: &str) -> Result<String, DashboardError> {
        let response = self.client.get_account(account_id).await?;
        if !response.success {
            return Err(DashboardError::domain(
                "Failed to fetch account details",
                response.error,
                "Account not found",
            ));
        }
        let account = response
            .account
            .ok_or_else(|| DashboardError::NotFound(format!("account {}", account_id)))?;
        if account.name.is_empty() {
            Ok(format!("Account {}", account_id))
        } else {
            Ok(account.name)
        }
    }

    async fn estimate_max_fees(
        &self,
        resolved: &ResolvedSettlement,
    ) -> Result<String, DashboardError> {
        let request = FeeEstimationRequest::ethereum_like_send(
            &resolved.account_id,
            &resolved.account_name,
            &resolved.amount_wei,
            &resolved.recipient,
            &resolved.currency,
        );
        let response = self.client.estimate_fees(&request).await?;
        if !response.success {
            return Err(DashboardError::domain(
                "Failed to estimate transaction fees",
                response.error,
                "Unknown error",
            ));
        }
        let max_fees = response
            .fee_estimation
            .and_then(|estimate| estimate.max_fees)
            .filter(|fees| !fees.is_empty())
            .unwrap_or_else(|| "0".to_string());
        log::debug!(
            "Fee estimate for {}: max_fees={}",
            resolved.settlement_id,
            max_fees
        );
        Ok(max_fees)
    }
}

fn require_fields(fields: &[&String]) -> Result<(), DashboardError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(DashboardError::Validation(
            "Please fill in all required fields".to_string(),
        ));
    }
    Ok(())
}
