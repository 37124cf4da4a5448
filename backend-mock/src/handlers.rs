/// Axum HTTP handlers for the custody API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::store::{
    Endpoint, Failure, FeeQuote, MockBackend, PENDING_APPROVAL, PLEDGE_INCREMENT_REQUEST,
};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockBackend>;

fn rejected(error: &str) -> Response {
    Json(json!({ "success": false, "error": error })).into_response()
}

fn failure_response(failure: Failure) -> Response {
    match failure {
        Failure::Rejected(error) => rejected(&error),
        Failure::Status(code, error) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "success": false, "error": error }))).into_response()
        }
        Failure::Garbage => (StatusCode::OK, "<html>upstream unavailable</html>").into_response(),
    }
}

/// Record the call, apply any configured delay, and return the injected
/// failure response if one is set
async fn intercept(
    backend: &MockBackend,
    endpoint: Endpoint,
    path: String,
    body: Option<Value>,
) -> Option<Response> {
    let (delay, failure) = backend.record(endpoint, &path, body);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    failure.map(failure_response)
}

/// GET /health
pub async fn health_check(State(backend): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        pledges: backend.pledges().len(),
    })
}

/// POST /authenticate
/// Exchanges an API key pair for a bearer token; unknown keys get 401
pub async fn authenticate(State(backend): State<AppState>, Json(body): Json<Value>) -> Response {
    if let Some(response) =
        intercept(&backend, Endpoint::Authenticate, "/authenticate".into(), Some(body.clone())).await
    {
        return response;
    }

    let request: AuthenticateBody = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, rejected(&e.to_string())).into_response(),
    };

    match backend.authenticate(&request) {
        Some(token) => Json(json!({ "success": true, "token": token })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Invalid API key credentials" })),
        )
            .into_response(),
    }
}

/// GET /list-all-pledges
pub async fn list_all_pledges(State(backend): State<AppState>) -> Response {
    if let Some(response) =
        intercept(&backend, Endpoint::ListAllPledges, "/list-all-pledges".into(), None).await
    {
        return response;
    }

    let pledges = backend.pledges();
    Json(json!({
        "success": true,
        "total_count": pledges.len(),
        "page": 1,
        "page_size": 50,
        "has_next_page": false,
        "pledges": pledges,
    }))
    .into_response()
}

/// GET /list-pending-requests?type=..&status=..
/// Pledge-increment requests come back node-wrapped, settlements flat
pub async fn list_pending_requests(
    State(backend): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Response {
    let request_type = query.request_type.unwrap_or_default();
    let status = query
        .status
        .unwrap_or_else(|| PENDING_APPROVAL.to_string());
    let path = format!("/list-pending-requests?type={}&status={}", request_type, status);

    if let Some(response) = intercept(&backend, Endpoint::ListPendingRequests, path, None).await {
        return response;
    }

    let requests = backend.pending(&request_type, &status);
    let requests: Vec<Value> = if request_type == PLEDGE_INCREMENT_REQUEST {
        requests
            .into_iter()
            .map(|r| json!({ "node": r, "cursor": format!("cursor-{}", r.id) }))
            .collect()
    } else {
        requests.into_iter().map(|r| json!(r)).collect()
    };

    Json(json!({ "success": true, "requests": requests })).into_response()
}

/// GET /account/{account_id}
pub async fn get_account(
    State(backend): State<AppState>,
    Path(account_id): Path<String>,
) -> Response {
    let path = format!("/account/{}", account_id);
    if let Some(response) = intercept(&backend, Endpoint::Account, path, None).await {
        return response;
    }

    match backend.account(&account_id) {
        Some(account) => Json(json!({ "success": true, "account": account })).into_response(),
        None => rejected("Account not found"),
    }
}

/// GET /get-pledge-challenge/{pledge_id}
pub async fn get_pledge_challenge(
    State(backend): State<AppState>,
    Path(pledge_id): Path<String>,
) -> Response {
    let path = format!("/get-pledge-challenge/{}", pledge_id);
    if let Some(response) = intercept(&backend, Endpoint::PledgeChallenge, path, None).await {
        return response;
    }

    match backend.challenge(&pledge_id) {
        Some(challenge) => {
            let raw = serde_json::to_string(&challenge).unwrap_or_default();
            Json(json!({
                "success": true,
                "challenge": { "decoded": challenge, "raw": raw },
            }))
            .into_response()
        }
        None => rejected("No challenge found for pledge"),
    }
}

/// POST /approve-pledge/{pledge_id}
pub async fn approve_pledge(
    State(backend): State<AppState>,
    Path(pledge_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/approve-pledge/{}", pledge_id);
    if let Some(response) =
        intercept(&backend, Endpoint::ApprovePledge, path, Some(body.clone())).await
    {
        return response;
    }

    let request: ApproveBody = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, rejected(&e.to_string())).into_response(),
    };
    if !request.private_key.contains("PRIVATE KEY") {
        return rejected("Invalid private key");
    }

    match backend.approve(&pledge_id) {
        Some(request_id) => {
            log::info!("Approved {} via {}", pledge_id, request_id);
            Json(json!({
                "success": true,
                "pledge_id": pledge_id,
                "request_id": request_id,
                "is_approved": true,
                "state": "APPROVED",
            }))
            .into_response()
        }
        None => rejected("No pending request for this pledge"),
    }
}

/// GET /pledge/{pledge_id}
pub async fn get_pledge(
    State(backend): State<AppState>,
    Path(pledge_id): Path<String>,
) -> Response {
    let path = format!("/pledge/{}", pledge_id);
    if let Some(response) = intercept(&backend, Endpoint::Pledge, path, None).await {
        return response;
    }

    match backend.pledge(&pledge_id) {
        Some(pledge) => Json(json!({ "success": true, "pledge": pledge })).into_response(),
        None => rejected("Pledge not found"),
    }
}

/// POST /estimate-fees
pub async fn estimate_fees(State(backend): State<AppState>, Json(body): Json<Value>) -> Response {
    if let Some(response) =
        intercept(&backend, Endpoint::EstimateFees, "/estimate-fees".into(), Some(body)).await
    {
        return response;
    }

    let body = match backend.fee_quote() {
        FeeQuote::Fixed(max_fees) => json!({
            "success": true,
            "fee_estimation": { "max_fees": max_fees },
        }),
        FeeQuote::EmptyEstimate => json!({ "success": true, "fee_estimation": {} }),
        FeeQuote::Missing => json!({ "success": true }),
    };
    Json(body).into_response()
}

/// POST /create-settlement
pub async fn create_settlement(
    State(backend): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = intercept(
        &backend,
        Endpoint::CreateSettlement,
        "/create-settlement".into(),
        Some(body.clone()),
    )
    .await
    {
        return response;
    }

    if body.get("id").and_then(Value::as_str).is_none() {
        return rejected("Settlement id is required");
    }
    backend.store_settlement(body);
    Json(json!({ "success": true })).into_response()
}
