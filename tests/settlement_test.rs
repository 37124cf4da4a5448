mod common;

use backend_mock::{Endpoint, Failure, FeeQuote, DEFAULT_MAX_FEES};
use common::TestEnvironment;
use pledge_admin::{
    DashboardError, InboundRequest, OutboundRequest, SettlementDesk, SettlementFlow,
    SettlementKind, SettlementStage,
};
use serde_json::Value;

fn outbound(pledge_id: &str, amount_eth: &str) -> OutboundRequest {
    OutboundRequest {
        pledge_id: pledge_id.to_string(),
        recipient_address: "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string(),
        amount_eth: amount_eth.to_string(),
    }
}

#[tokio::test]
async fn test_outbound_settlement_prepared_and_confirmed() {
    let env = TestEnvironment::new().await.unwrap();
    let mut flow = SettlementFlow::new(env.client());

    let draft = flow.prepare_outbound(&outbound("pledge-1", "1")).await.unwrap();

    assert_eq!(draft.kind, SettlementKind::Outbound);
    assert_eq!(draft.amount_wei, "1000000000000000000");
    assert_eq!(draft.account_name, "Treasury");
    assert_eq!(draft.max_fees, DEFAULT_MAX_FEES);
    assert_eq!(flow.stage(), &SettlementStage::ReadyForConfirmation);

    let intent = draft.payload.outbound_transaction_intent.as_ref().unwrap();
    assert_eq!(intent.account_id, "acc-1");
    assert_eq!(intent.transaction_data.currency, "ethereum");
    assert!(intent.fees_strategy.is_some());
    assert!(draft.payload.inbound_transaction_intent.is_none());

    // Nothing is created until the operator confirms
    assert_eq!(env.backend.call_count(Endpoint::CreateSettlement), 0);

    let settlement_id = flow.confirm().await.unwrap();
    assert_eq!(settlement_id, draft.settlement_id);
    assert_eq!(flow.stage(), &SettlementStage::Done { settlement_id });

    let created = env.backend.created_settlements();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["id"], settlement_id.to_string());
    assert_eq!(created[0]["from_pledge_id"], "pledge-1");
    assert_eq!(
        created[0]["outbound_transaction_intent"]["transaction_data"]["amount"],
        "1000000000000000000"
    );
    assert_eq!(
        created[0]["outbound_transaction_intent"]["transaction_data"]["max_fees"],
        DEFAULT_MAX_FEES
    );
}

#[tokio::test]
async fn test_fee_estimation_failure_returns_to_idle() {
    let env = TestEnvironment::new().await.unwrap();
    env.backend.fail(
        Endpoint::EstimateFees,
        Failure::Rejected("insufficient liquidity".to_string()),
    );
    let mut flow = SettlementFlow::new(env.client());

    let err = flow
        .prepare_outbound(&outbound("pledge-1", "0.25"))
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Domain { .. }));
    assert_eq!(
        err.to_string(),
        "Failed to estimate transaction fees: insufficient liquidity"
    );
    assert_eq!(flow.stage(), &SettlementStage::Idle);
    assert!(flow.draft().is_none());
    assert_eq!(
        flow.last_error(),
        Some("Failed to estimate transaction fees: insufficient liquidity")
    );
    assert_eq!(env.backend.call_count(Endpoint::EstimateFees), 1);
    assert_eq!(env.backend.call_count(Endpoint::CreateSettlement), 0);

    // Confirming without a prepared payload is refused locally
    let err = flow.confirm().await.unwrap_err();
    assert!(matches!(err, DashboardError::InvalidState(_)));
    assert_eq!(env.backend.call_count(Endpoint::CreateSettlement), 0);
}

#[tokio::test]
async fn test_invalid_amounts_never_reach_backend() {
    let env = TestEnvironment::new().await.unwrap();
    let mut flow = SettlementFlow::new(env.client());

    for amount in [
        "",
        "   ",
        "-1",
        "0",
        "abc",
        "0.0000000000000000001",
        "1.00000000000000000000000000001",
    ] {
        let err = flow
            .prepare_outbound(&outbound("pledge-1", amount))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DashboardError::Validation(_)),
            "amount {:?} gave {:?}",
            amount,
            err
        );
    }

    let err = flow.prepare_outbound(&outbound("", "1")).await.unwrap_err();
    assert_eq!(err.to_string(), "Please fill in all required fields");

    assert_eq!(env.backend.total_calls(), 0);
    assert_eq!(flow.stage(), &SettlementStage::Idle);
}

#[tokio::test]
async fn test_unknown_pledge_stops_before_account_lookup() {
    let env = TestEnvironment::new().await.unwrap();
    let mut flow = SettlementFlow::new(env.client());

    let err = flow
        .prepare_outbound(&outbound("pledge-404", "1"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to verify pledge details: Pledge not found"
    );
    assert_eq!(env.backend.call_count(Endpoint::Pledge), 1);
    assert_eq!(env.backend.call_count(Endpoint::Account), 0);
    assert_eq!(env.backend.call_count(Endpoint::EstimateFees), 0);
}

#[tokio::test]
async fn test_inbound_settlement_targets_destination_account() {
    let env = TestEnvironment::new().await.unwrap();
    let mut flow = SettlementFlow::new(env.client());

    let request = InboundRequest {
        pledge_id: "pledge-1".to_string(),
        to_account_id: "acc-2".to_string(),
        to_address: "0xdef0000000000000000000000000000000000001".to_string(),
        amount_eth: "0.5".to_string(),
    };
    let draft = flow.prepare_inbound(&request).await.unwrap();

    assert_eq!(draft.kind, SettlementKind::Inbound);
    assert_eq!(draft.amount_wei, "500000000000000000");
    assert_eq!(draft.account_name, "Market Maker");
    assert_eq!(draft.payload.to_account_id.as_deref(), Some("acc-2"));
    assert!(draft.payload.outbound_transaction_intent.is_none());

    let intent = draft.payload.inbound_transaction_intent.as_ref().unwrap();
    assert_eq!(intent.account_id, "acc-2");
    assert!(intent.fees_strategy.is_none());
    assert_eq!(intent.transaction_data.currency, "ethereum_holesky");
    assert_eq!(
        intent.transaction_data.recipient,
        "0xdef0000000000000000000000000000000000001"
    );

    let account_calls: Vec<String> = env
        .backend
        .calls()
        .into_iter()
        .filter(|call| call.endpoint == Endpoint::Account)
        .map(|call| call.path)
        .collect();
    assert_eq!(account_calls, vec!["/account/acc-2".to_string()]);
}

#[tokio::test]
async fn test_failed_confirmation_keeps_draft_for_resubmission() {
    let env = TestEnvironment::new().await.unwrap();
    let desk = SettlementDesk::new(env.client());

    let draft = desk.prepare_outbound(&outbound("pledge-1", "2")).await.unwrap();
    assert_eq!(desk.pending_count(), 1);

    env.backend.fail(
        Endpoint::CreateSettlement,
        Failure::Rejected("duplicate settlement".to_string()),
    );
    let err = desk.confirm(draft.settlement_id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to create settlement: duplicate settlement"
    );
    assert_eq!(desk.draft(draft.settlement_id), Some(draft.clone()));

    env.backend.clear_failure(Endpoint::CreateSettlement);
    let settlement_id = desk.confirm(draft.settlement_id).await.unwrap();
    assert_eq!(settlement_id, draft.settlement_id);
    assert_eq!(desk.pending_count(), 0);

    // Both submissions carried the same payload
    let bodies: Vec<_> = env
        .backend
        .calls()
        .into_iter()
        .filter(|call| call.endpoint == Endpoint::CreateSettlement)
        .filter_map(|call| call.body)
        .collect();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0], bodies[1]);

    // A confirmed draft cannot be submitted twice
    let err = desk.confirm(draft.settlement_id).await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(_)));
}

#[tokio::test]
async fn test_max_fees_default_to_zero_without_estimate() {
    for quote in [FeeQuote::EmptyEstimate, FeeQuote::Missing, FeeQuote::Fixed(String::new())] {
        let env = TestEnvironment::new().await.unwrap();
        env.backend.set_fee_quote(quote.clone());
        let mut flow = SettlementFlow::new(env.client());

        let draft = flow.prepare_outbound(&outbound("pledge-1", "1")).await.unwrap();
        assert_eq!(draft.max_fees, "0", "{:?}", quote);
        let intent = draft.payload.outbound_transaction_intent.as_ref().unwrap();
        assert_eq!(intent.transaction_data.max_fees, "0");

        flow.confirm().await.unwrap();
        let created = env.backend.created_settlements();
        assert_eq!(
            created[0]["outbound_transaction_intent"]["transaction_data"]["max_fees"],
            Value::from("0")
        );
    }
}

#[tokio::test]
async fn test_discarded_draft_cannot_be_confirmed() {
    let env = TestEnvironment::new().await.unwrap();
    let desk = SettlementDesk::new(env.client());

    let draft = desk.prepare_outbound(&outbound("pledge-1", "1")).await.unwrap();
    assert_eq!(desk.pending_count(), 1);

    desk.discard(draft.settlement_id).unwrap();
    assert_eq!(desk.pending_count(), 0);
    assert!(desk.draft(draft.settlement_id).is_none());

    let err = desk.confirm(draft.settlement_id).await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(_)));
    let err = desk.discard(draft.settlement_id).unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(_)));
    assert_eq!(env.backend.call_count(Endpoint::CreateSettlement), 0);
}

#[tokio::test]
async fn test_oldest_unconfirmed_draft_is_evicted() {
    let env = TestEnvironment::new().await.unwrap();
    let desk = SettlementDesk::with_capacity(env.client(), 2);

    let first = desk.prepare_outbound(&outbound("pledge-1", "1")).await.unwrap();
    let second = desk.prepare_outbound(&outbound("pledge-1", "2")).await.unwrap();
    let third = desk.prepare_outbound(&outbound("pledge-1", "3")).await.unwrap();

    assert_eq!(desk.pending_count(), 2);
    assert!(desk.draft(first.settlement_id).is_none());
    assert_eq!(desk.draft(second.settlement_id), Some(second.clone()));
    assert_eq!(desk.draft(third.settlement_id), Some(third.clone()));

    let err = desk.confirm(first.settlement_id).await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(_)));
    assert_eq!(desk.confirm(third.settlement_id).await.unwrap(), third.settlement_id);
    assert_eq!(desk.pending_count(), 1);
}
