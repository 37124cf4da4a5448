use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::types::*;
use crate::approval::{describe_failure, ApprovalOutcome};
use crate::client::DecodedChallenge;
use crate::error::DashboardError;
use crate::manager::DashboardManager;
use crate::pending::PendingSnapshot;
use crate::pledges::PledgeRow;
use crate::settlement::{InboundRequest, OutboundRequest, SettlementDraft};

pub type AppState = Arc<DashboardManager>;

pub async fn health_handler(State(manager): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: manager.config.api_url.clone(),
        refresh_key: manager.refresh_key().current(),
    })
}

pub async fn list_pledges_handler(
    State(manager): State<AppState>,
) -> Result<Json<Vec<PledgeRow>>, DashboardError> {
    let rows = manager.pledge_rows().await?;
    Ok(Json(rows))
}

pub async fn list_pending_handler(State(manager): State<AppState>) -> Json<PendingSnapshot> {
    Json(manager.pending_requests().await)
}

pub async fn challenge_handler(
    State(manager): State<AppState>,
    Path(pledge_id): Path<String>,
) -> Result<Json<DecodedChallenge>, DashboardError> {
    let challenge = manager.open_challenge(&pledge_id).await?;
    Ok(Json(challenge))
}

/// Approval failures are answered with the classified, operator-facing
/// message rather than the raw error text
pub async fn approve_handler(
    State(manager): State<AppState>,
    Path(target_id): Path<String>,
    Json(req): Json<ApproveRequest>,
) -> Response {
    match manager.approve(&target_id, &req.private_key, req.kind).await {
        Ok(outcome) if outcome.success => Json(outcome).into_response(),
        Ok(outcome) => (StatusCode::UNPROCESSABLE_ENTITY, Json(outcome)).into_response(),
        Err(e) => {
            let outcome = ApprovalOutcome {
                success: false,
                message: describe_failure(&e),
                state: None,
            };
            (e.status_code(), Json(outcome)).into_response()
        }
    }
}

pub async fn prepare_outbound_handler(
    State(manager): State<AppState>,
    Json(req): Json<OutboundRequest>,
) -> Result<Json<SettlementDraft>, DashboardError> {
    let draft = manager.prepare_outbound(&req).await?;
    Ok(Json(draft))
}

pub async fn prepare_inbound_handler(
    State(manager): State<AppState>,
    Json(req): Json<InboundRequest>,
) -> Result<Json<SettlementDraft>, DashboardError> {
    let draft = manager.prepare_inbound(&req).await?;
    Ok(Json(draft))
}

pub async fn confirm_settlement_handler(
    State(manager): State<AppState>,
    Path(settlement_id): Path<Uuid>,
) -> Result<Json<ConfirmSettlementResponse>, DashboardError> {
    let settlement_id = manager.confirm_settlement(settlement_id).await?;
    Ok(Json(ConfirmSettlementResponse {
        settlement_id,
        message: format!("Settlement created successfully. Settlement ID: {}", settlement_id),
    }))
}

pub async fn discard_settlement_handler(
    State(manager): State<AppState>,
    Path(settlement_id): Path<Uuid>,
) -> Result<Json<DiscardSettlementResponse>, DashboardError> {
    manager.discard_settlement(settlement_id)?;
    Ok(Json(DiscardSettlementResponse {
        settlement_id,
        discarded: true,
    }))
}

pub async fn refresh_handler(State(manager): State<AppState>) -> Json<RefreshResponse> {
    Json(RefreshResponse {
        refresh_key: manager.refresh_all(),
    })
}

pub async fn get_credentials_handler(
    State(manager): State<AppState>,
) -> Result<Json<CredentialsResponse>, DashboardError> {
    let stored = manager.stored_credentials()?;
    Ok(Json(CredentialsResponse::from(stored)))
}

pub async fn save_credentials_handler(
    State(manager): State<AppState>,
    Json(req): Json<SaveCredentialsRequest>,
) -> Result<Json<CredentialsResponse>, DashboardError> {
    let stored = manager
        .save_credentials(&req.api_user, &req.api_secret)
        .await?;
    Ok(Json(CredentialsResponse::from(stored)))
}
