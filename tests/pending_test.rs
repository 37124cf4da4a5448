mod common;

use std::time::Duration;

use backend_mock::{Endpoint, Failure};
use common::TestEnvironment;
use pledge_admin::{DashboardError, ListState, PendingRequests, RefreshKey};

#[tokio::test]
async fn test_refresh_normalizes_wrapped_and_flat_requests() {
    let env = TestEnvironment::new().await.unwrap();
    let pending = PendingRequests::new(env.client(), RefreshKey::new());

    let snapshot = pending.refresh().await;

    // Pledge increments arrive as {node, cursor}, settlements flat
    let increments = snapshot.pledge_increments.requests();
    assert_eq!(increments.len(), 1);
    assert_eq!(increments[0].id, "req-1");
    assert_eq!(increments[0].pledge_target(), Some("pledge-2"));
    assert_eq!(increments[0].status, "PENDING_APPROVAL");

    let settlements = snapshot.settlements.requests();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].id, "req-2");
    assert_eq!(settlements[0].target_type, "SETTLEMENT");

    let paths: Vec<String> = env.backend.calls().into_iter().map(|c| c.path).collect();
    assert!(paths.contains(
        &"/list-pending-requests?type=CREATE_PLEDGE_INCREMENT&status=PENDING_APPROVAL".to_string()
    ));
    assert!(paths.contains(
        &"/list-pending-requests?type=CREATE_TRANSACTION&status=PENDING_APPROVAL".to_string()
    ));
}

#[tokio::test]
async fn test_rejected_lists_surface_backend_error() {
    let env = TestEnvironment::new().await.unwrap();
    env.backend.fail(
        Endpoint::ListPendingRequests,
        Failure::Rejected("timeout".to_string()),
    );
    let pending = PendingRequests::new(env.client(), RefreshKey::new());

    let snapshot = pending.refresh().await;

    assert_eq!(
        snapshot.pledge_increments,
        ListState::Failed {
            error: "timeout".to_string()
        }
    );
    assert_eq!(snapshot.settlements.error(), Some("timeout"));
    assert!(snapshot.settlements.requests().is_empty());
    assert_eq!(env.backend.call_count(Endpoint::ListPendingRequests), 2);
}

#[tokio::test]
async fn test_http_failure_marks_lists_failed() {
    let env = TestEnvironment::new().await.unwrap();
    env.backend.fail(
        Endpoint::ListPendingRequests,
        Failure::Status(500, "database unavailable".to_string()),
    );
    let pending = PendingRequests::new(env.client(), RefreshKey::new());

    let snapshot = pending.refresh().await;

    assert_eq!(
        snapshot.pledge_increments.error(),
        Some("database unavailable")
    );
    assert_eq!(snapshot.settlements.error(), Some("database unavailable"));
}

#[tokio::test]
async fn test_superseded_refresh_is_discarded() {
    let env = TestEnvironment::new().await.unwrap();
    let pending = PendingRequests::new(env.client(), RefreshKey::new());

    // The first refresh is slow and fails
    env.backend.delay(Endpoint::ListPendingRequests, Duration::from_millis(400));
    env.backend.fail(
        Endpoint::ListPendingRequests,
        Failure::Rejected("stale".to_string()),
    );
    let slow = {
        let pending = pending.clone();
        tokio::spawn(async move { pending.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The second refresh is fast and succeeds
    env.backend.clear_delay(Endpoint::ListPendingRequests);
    env.backend.clear_failure(Endpoint::ListPendingRequests);
    let fresh = pending.refresh().await;
    assert_eq!(fresh.pledge_increments.requests().len(), 1);

    slow.await.unwrap();

    let snapshot = pending.snapshot();
    assert_eq!(snapshot.pledge_increments.requests().len(), 1);
    assert_eq!(snapshot.settlements.requests().len(), 1);
    assert!(snapshot.pledge_increments.error().is_none());
}

#[tokio::test]
async fn test_open_challenge_returns_decoded_payload() {
    let env = TestEnvironment::new().await.unwrap();
    let pending = PendingRequests::new(env.client(), RefreshKey::new());

    let challenge = pending.open_challenge("pledge-2").await.unwrap();

    assert_eq!(challenge.kind, "PLEDGE_INCREMENT");
    assert_eq!(challenge.antireplay, "f3b1c0de");
    assert_eq!(challenge.data.account_name, "Market Maker");
    assert_eq!(challenge.data.total_pledge, "3000000");

    let state = pending.snapshot().challenge;
    assert!(!state.loading);
    assert_eq!(state.pledge_id.as_deref(), Some("pledge-2"));
    assert_eq!(state.challenge, Some(challenge));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_missing_challenge_is_reported() {
    let env = TestEnvironment::new().await.unwrap();
    let pending = PendingRequests::new(env.client(), RefreshKey::new());

    let err = pending.open_challenge("pledge-1").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to fetch challenge: No challenge found for pledge"
    );

    let state = pending.snapshot().challenge;
    assert!(!state.loading);
    assert!(state.challenge.is_none());
    assert_eq!(state.error, Some(err.to_string()));

    let err = pending.open_challenge("  ").await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));
    assert_eq!(env.backend.call_count(Endpoint::PledgeChallenge), 1);
}
