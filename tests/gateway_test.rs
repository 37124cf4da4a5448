mod common;

use std::sync::Arc;

use backend_mock::Endpoint;
use common::{TestEnvironment, TEST_PEM};
use pledge_admin::api::server::create_router;
use serde_json::{json, Value};

/// Serve the operator gateway for `env` on an ephemeral port
async fn spawn_gateway(env: &TestEnvironment) -> String {
    let manager = Arc::new(env.manager());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(manager)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_and_pledge_listing() {
    let env = TestEnvironment::new().await.unwrap();
    let base = spawn_gateway(&env).await;
    let http = reqwest::Client::new();

    let health: Value = http
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["refresh_key"], 0);

    let response = http.get(format!("{}/api/pledges", base)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let rows: Value = response.json().await.unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 3);
    assert_eq!(rows[0]["account_name"], "Treasury");
    assert_eq!(rows[0]["status"], "ready");
}

#[tokio::test]
async fn test_approve_route_maps_failures() {
    let env = TestEnvironment::new().await.unwrap();
    let base = spawn_gateway(&env).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/approve/pledge-2", base))
        .json(&json!({ "private_key": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Please provide a private key in PEM format");

    let response = http
        .post(format!("{}/api/approve/pledge-2", base))
        .json(&json!({ "private_key": TEST_PEM, "kind": "pledge" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["state"], "APPROVED");
    assert_eq!(env.backend.call_count(Endpoint::ApprovePledge), 1);
}

#[tokio::test]
async fn test_settlement_prepare_and_confirm_routes() {
    let env = TestEnvironment::new().await.unwrap();
    let base = spawn_gateway(&env).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/settlements/outbound", base))
        .json(&json!({
            "pledge_id": "pledge-1",
            "recipient_address": "0xabc",
            "amount_eth": "1.5"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let draft: Value = response.json().await.unwrap();
    assert_eq!(draft["amount_wei"], "1500000000000000000");
    assert_eq!(draft["kind"], "outbound");

    let settlement_id = draft["settlement_id"].as_str().unwrap().to_string();
    let response = http
        .post(format!("{}/api/settlements/{}/confirm", base, settlement_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let confirmed: Value = response.json().await.unwrap();
    assert_eq!(confirmed["settlement_id"], settlement_id);
    assert_eq!(env.backend.created_settlements().len(), 1);

    // Already confirmed
    let response = http
        .post(format!("{}/api/settlements/{}/confirm", base, settlement_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_invalid_amount_is_bad_request() {
    let env = TestEnvironment::new().await.unwrap();
    let base = spawn_gateway(&env).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/settlements/inbound", base))
        .json(&json!({
            "pledge_id": "pledge-1",
            "to_account_id": "acc-2",
            "to_address": "0xdef",
            "amount_eth": "-3"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("greater than zero"));
    assert_eq!(env.backend.total_calls(), 0);
}

#[tokio::test]
async fn test_refresh_route_bumps_key() {
    let env = TestEnvironment::new().await.unwrap();
    let base = spawn_gateway(&env).await;
    let http = reqwest::Client::new();

    let body: Value = http
        .post(format!("{}/api/refresh", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["refresh_key"], 1);
}

#[tokio::test]
async fn test_discard_route_drops_unconfirmed_draft() {
    let env = TestEnvironment::new().await.unwrap();
    let base = spawn_gateway(&env).await;
    let http = reqwest::Client::new();

    let draft: Value = http
        .post(format!("{}/api/settlements/outbound", base))
        .json(&json!({
            "pledge_id": "pledge-1",
            "recipient_address": "0xabc",
            "amount_eth": "0.5"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let settlement_id = draft["settlement_id"].as_str().unwrap().to_string();

    let response = http
        .delete(format!("{}/api/settlements/{}", base, settlement_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["settlement_id"], settlement_id);
    assert_eq!(body["discarded"], true);

    // Gone: neither confirmable nor discardable again
    let response = http
        .post(format!("{}/api/settlements/{}/confirm", base, settlement_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let response = http
        .delete(format!("{}/api/settlements/{}", base, settlement_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(env.backend.call_count(Endpoint::CreateSettlement), 0);
}

#[tokio::test]
async fn test_settings_route_reports_saved_user() {
    let env = TestEnvironment::new().await.unwrap();
    let base = spawn_gateway(&env).await;
    let http = reqwest::Client::new();

    let before: Value = http
        .get(format!("{}/api/settings/credentials", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["api_user"], Value::Null);
    assert_eq!(before["has_token"], false);

    let response = http
        .post(format!("{}/api/settings/credentials", base))
        .json(&json!({ "api_user": "operator", "api_secret": "operator-secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let after: Value = http
        .get(format!("{}/api/settings/credentials", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["api_user"], "operator");
    assert_eq!(after["has_token"], true);
    assert!(after.get("api_secret").is_none());
}
