/// In-memory backend state with call recording and failure injection

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::types::*;

pub const PLEDGE_INCREMENT_REQUEST: &str = "CREATE_PLEDGE_INCREMENT";
pub const SETTLEMENT_REQUEST: &str = "CREATE_TRANSACTION";
pub const PENDING_APPROVAL: &str = "PENDING_APPROVAL";
pub const DEFAULT_MAX_FEES: &str = "21000000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Authenticate,
    ListAllPledges,
    ListPendingRequests,
    Account,
    PledgeChallenge,
    ApprovePledge,
    Pledge,
    EstimateFees,
    CreateSettlement,
}

/// An injected answer that replaces the normal response
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// HTTP 200 with `{success: false, error}`
    Rejected(String),
    /// The given HTTP status with `{success: false, error}`
    Status(u16, String),
    /// HTTP 200 with a body that is not JSON
    Garbage,
}

/// Shape of the `/estimate-fees` answer
#[derive(Debug, Clone, PartialEq)]
pub enum FeeQuote {
    /// `fee_estimation.max_fees` set to the given value
    Fixed(String),
    /// `fee_estimation` present without `max_fees`
    EmptyEstimate,
    /// No `fee_estimation` at all
    Missing,
}

impl Default for FeeQuote {
    fn default() -> Self {
        FeeQuote::Fixed(DEFAULT_MAX_FEES.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    pledges: Vec<MockPledge>,
    accounts: HashMap<String, MockAccount>,
    pledge_requests: Vec<MockRequest>,
    settlement_requests: Vec<MockRequest>,
    challenges: HashMap<String, MockChallenge>,
    api_keys: HashMap<String, String>,
    fee_quote: FeeQuote,
    failures: HashMap<Endpoint, Failure>,
    delays: HashMap<Endpoint, Duration>,
    calls: Vec<RecordedCall>,
    settlements: Vec<Value>,
    token_counter: u64,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<State>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a small, consistent data set for local development
    pub fn seeded() -> Self {
        let backend = Self::new();

        backend.add_api_key("operator", "operator-secret");

        backend.add_account("acc-1", "Treasury", "ethereum");
        backend.add_account("acc-2", "Market Maker", "USDC");

        backend.add_pledge("pledge-1", "acc-1", "1000000000000000000", "PLEDGE_READY");
        backend.add_pledge("pledge-2", "acc-2", "2500000", "PENDING");
        backend.add_pledge("pledge-3", "acc-1", "123456789000000000", "ASSIGNED");

        backend.add_pledge_request("req-1", "pledge-2");
        backend.add_settlement_request("req-2", "settlement-1");

        backend.set_challenge(
            "pledge-2",
            MockChallenge {
                kind: "PLEDGE_INCREMENT".to_string(),
                antireplay: "f3b1c0de".to_string(),
                data: MockChallengeData {
                    account_name: "Market Maker".to_string(),
                    amount: "500000".to_string(),
                    currency: "USDC".to_string(),
                    exchange: "mock-exchange".to_string(),
                    timestamp: "2024-01-15T10:30:00Z".to_string(),
                    total_pledge: "3000000".to_string(),
                },
            },
        );

        backend
    }

    // ============================================================================
    // Seeding
    // ============================================================================

    pub fn add_api_key(&self, key_id: &str, secret: &str) {
        self.lock()
            .api_keys
            .insert(key_id.to_string(), secret.to_string());
    }

    pub fn add_account(&self, id: &str, name: &str, currency: &str) {
        self.lock().accounts.insert(
            id.to_string(),
            MockAccount {
                id: id.to_string(),
                name: name.to_string(),
                currency: currency.to_string(),
                balance: 0.0,
            },
        );
    }

    pub fn add_pledge(&self, id: &str, account_id: &str, amount: &str, state: &str) {
        self.insert_pledge(MockPledge {
            id: id.to_string(),
            account_id: account_id.to_string(),
            amount: amount.to_string(),
            state: state.to_string(),
            currency: None,
            created_at: "2024-01-15T10:30:00Z".to_string(),
            updated_at: "2024-01-15T10:30:00Z".to_string(),
        });
    }

    pub fn insert_pledge(&self, pledge: MockPledge) {
        let mut state = self.lock();
        state.pledges.retain(|p| p.id != pledge.id);
        state.pledges.push(pledge);
    }

    pub fn add_pledge_request(&self, id: &str, pledge_id: &str) {
        let request = pending_request(id, pledge_id, "PLEDGE");
        self.lock().pledge_requests.push(request);
    }

    pub fn add_settlement_request(&self, id: &str, target_id: &str) {
        let request = pending_request(id, target_id, "SETTLEMENT");
        self.lock().settlement_requests.push(request);
    }

    pub fn set_challenge(&self, pledge_id: &str, challenge: MockChallenge) {
        self.lock()
            .challenges
            .insert(pledge_id.to_string(), challenge);
    }

    pub fn set_fee_quote(&self, quote: FeeQuote) {
        self.lock().fee_quote = quote;
    }

    // ============================================================================
    // Failure injection
    // ============================================================================

    pub fn fail(&self, endpoint: Endpoint, failure: Failure) {
        self.lock().failures.insert(endpoint, failure);
    }

    pub fn clear_failure(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    pub fn delay(&self, endpoint: Endpoint, delay: Duration) {
        self.lock().delays.insert(endpoint, delay);
    }

    pub fn clear_delay(&self, endpoint: Endpoint) {
        self.lock().delays.remove(&endpoint);
    }

    // ============================================================================
    // Inspection
    // ============================================================================

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// `private_key` fields exactly as posted to `/approve-pledge`
    pub fn received_private_keys(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.endpoint == Endpoint::ApprovePledge)
            .filter_map(|call| call.body.as_ref())
            .filter_map(|body| body.get("private_key").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Bodies accepted by `/create-settlement`
    pub fn created_settlements(&self) -> Vec<Value> {
        self.lock().settlements.clone()
    }

    pub fn pending_count(&self) -> usize {
        let state = self.lock();
        state.pledge_requests.len() + state.settlement_requests.len()
    }

    // ============================================================================
    // Request handling
    // ============================================================================

    /// Record the call and return the delay and injected failure, if any
    pub(crate) fn record(
        &self,
        endpoint: Endpoint,
        path: &str,
        body: Option<Value>,
    ) -> (Option<Duration>, Option<Failure>) {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            endpoint,
            path: path.to_string(),
            body,
        });
        (
            state.delays.get(&endpoint).copied(),
            state.failures.get(&endpoint).cloned(),
        )
    }

    pub(crate) fn authenticate(&self, body: &AuthenticateBody) -> Option<String> {
        let mut state = self.lock();
        let (key_id, secret) = match (&body.api_key_id, &body.api_key_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return None,
        };
        if state.api_keys.get(key_id) != Some(secret) {
            return None;
        }
        state.token_counter += 1;
        Some(format!("mock-token-{}-{}", key_id, state.token_counter))
    }

    pub(crate) fn pledges(&self) -> Vec<MockPledge> {
        self.lock().pledges.clone()
    }

    pub(crate) fn pledge(&self, pledge_id: &str) -> Option<MockPledge> {
        self.lock()
            .pledges
            .iter()
            .find(|p| p.id == pledge_id)
            .cloned()
    }

    pub(crate) fn account(&self, account_id: &str) -> Option<MockAccount> {
        self.lock().accounts.get(account_id).cloned()
    }

    pub(crate) fn challenge(&self, pledge_id: &str) -> Option<MockChallenge> {
        self.lock().challenges.get(pledge_id).cloned()
    }

    /// Pending requests of one type with the given status
    pub(crate) fn pending(&self, request_type: &str, status: &str) -> Vec<MockRequest> {
        let state = self.lock();
        let source = match request_type {
            PLEDGE_INCREMENT_REQUEST => &state.pledge_requests,
            SETTLEMENT_REQUEST => &state.settlement_requests,
            _ => return Vec::new(),
        };
        source
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    /// Approve every pending request pointing at `target_id`
    ///
    /// Returns the approved request id, or `None` when nothing was pending.
    pub(crate) fn approve(&self, target_id: &str) -> Option<String> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut approved = None;
        for requests in [&mut state.pledge_requests, &mut state.settlement_requests] {
            if let Some(pos) = requests.iter().position(|r| r.target_id == target_id) {
                approved = Some(requests.remove(pos).id);
            }
        }
        if approved.is_some() {
            if let Some(pledge) = state.pledges.iter_mut().find(|p| p.id == target_id) {
                pledge.state = "PLEDGE_READY".to_string();
            }
        }
        approved
    }

    pub(crate) fn fee_quote(&self) -> FeeQuote {
        self.lock().fee_quote.clone()
    }

    pub(crate) fn store_settlement(&self, payload: Value) {
        self.lock().settlements.push(payload);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn pending_request(id: &str, target_id: &str, target_type: &str) -> MockRequest {
    MockRequest {
        id: id.to_string(),
        target_id: target_id.to_string(),
        target_type: target_type.to_string(),
        status: PENDING_APPROVAL.to_string(),
        created_on: "2024-01-15T10:30:00Z".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_removes_pending_request() {
        let backend = MockBackend::seeded();
        assert_eq!(backend.pending_count(), 2);

        assert_eq!(backend.approve("pledge-2").as_deref(), Some("req-1"));
        assert_eq!(backend.pending_count(), 1);
        assert_eq!(backend.pledge("pledge-2").unwrap().state, "PLEDGE_READY");

        assert_eq!(backend.approve("pledge-2"), None);
    }

    #[test]
    fn test_authenticate_checks_secret() {
        let backend = MockBackend::seeded();
        let wrong = AuthenticateBody {
            api_key_id: Some("operator".to_string()),
            api_key_secret: Some("nope".to_string()),
        };
        assert!(backend.authenticate(&wrong).is_none());

        let right = AuthenticateBody {
            api_key_id: Some("operator".to_string()),
            api_key_secret: Some("operator-secret".to_string()),
        };
        assert_eq!(
            backend.authenticate(&right).as_deref(),
            Some("mock-token-operator-1")
        );
    }

    #[test]
    fn test_fee_quote_defaults_to_fixed() {
        let backend = MockBackend::new();
        assert_eq!(
            backend.fee_quote(),
            FeeQuote::Fixed(DEFAULT_MAX_FEES.to_string())
        );

        backend.set_fee_quote(FeeQuote::Missing);
        assert_eq!(backend.fee_quote(), FeeQuote::Missing);
    }
}
