//! Pending request aggregation
//!
//! Tracks the two approval queues (pledge increments and settlements) and the
//! challenge for whichever pledge the operator is about to approve. Each fetch
//! is tagged with an epoch so a slow, superseded response never overwrites a
//! newer one.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::client::{
    ApiClient, DecodedChallenge, PendingRequest, PENDING_APPROVAL, PLEDGE_INCREMENT_REQUEST,
    SETTLEMENT_REQUEST,
};
use crate::dashboard::RefreshKey;
use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ListState {
    Loading,
    Loaded { requests: Vec<PendingRequest> },
    Failed { error: String },
}

impl ListState {
    pub fn requests(&self) -> &[PendingRequest] {
        match self {
            ListState::Loaded { requests } => requests,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ListState::Failed { error } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChallengeState {
    pub loading: bool,
    pub pledge_id: Option<String>,
    pub challenge: Option<DecodedChallenge>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSnapshot {
    pub pledge_increments: ListState,
    pub settlements: ListState,
    pub challenge: ChallengeState,
}

impl Default for PendingSnapshot {
    fn default() -> Self {
        Self {
            pledge_increments: ListState::Loading,
            settlements: ListState::Loading,
            challenge: ChallengeState::default(),
        }
    }
}

#[derive(Default)]
struct Inner {
    list_epoch: u64,
    challenge_epoch: u64,
    snapshot: PendingSnapshot,
}

#[derive(Clone)]
pub struct PendingRequests {
    client: ApiClient,
    refresh_key: RefreshKey,
    inner: Arc<RwLock<Inner>>,
}

impl PendingRequests {
    pub fn new(client: ApiClient, refresh_key: RefreshKey) -> Self {
        Self {
            client,
            refresh_key,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    pub fn snapshot(&self) -> PendingSnapshot {
        self.read().snapshot.clone()
    }

    /// Fetch both pending queues concurrently and store the results
    pub async fn refresh(&self) -> PendingSnapshot {
        let epoch = {
            let mut inner = self.write();
            inner.list_epoch += 1;
            inner.snapshot.pledge_increments = ListState::Loading;
            inner.snapshot.settlements = ListState::Loading;
            inner.list_epoch
        };

        let (pledge_increments, settlements) = tokio::join!(
            self.fetch_list(
                PLEDGE_INCREMENT_REQUEST,
                "Failed to fetch pending pledge requests"
            ),
            self.fetch_list(
                SETTLEMENT_REQUEST,
                "Failed to fetch pending settlement requests"
            ),
        );

        let mut inner = self.write();
        if inner.list_epoch != epoch {
            log::debug!(
                "Discarding pending lists from refresh {} (current {})",
                epoch,
                inner.list_epoch
            );
            return inner.snapshot.clone();
        }
        inner.snapshot.pledge_increments = pledge_increments;
        inner.snapshot.settlements = settlements;
        inner.snapshot.clone()
    }

    async fn fetch_list(&self, request_type: &str, fallback: &str) -> ListState {
        match self
            .client
            .list_pending_requests(request_type, PENDING_APPROVAL)
            .await
        {
            Ok(list) if list.success => {
                let requests = list.into_requests();
                log::debug!("{} pending {} requests", requests.len(), request_type);
                ListState::Loaded { requests }
            }
            Ok(list) => ListState::Failed {
                error: list.error.unwrap_or_else(|| fallback.to_string()),
            },
            Err(e) => {
                log::warn!("Pending {} fetch failed: {}", request_type, e);
                ListState::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Fetch the challenge the operator must review before approving
    /// `pledge_id`
    pub async fn open_challenge(
        &self,
        pledge_id: &str,
    ) -> Result<DecodedChallenge, DashboardError> {
        if pledge_id.trim().is_empty() {
            return Err(DashboardError::Validation(
                "Request has no target pledge".to_string(),
            ));
        }

        let epoch = {
            let mut inner = self.write();
            inner.challenge_epoch += 1;
            inner.snapshot.challenge = ChallengeState {
                loading: true,
                pledge_id: Some(pledge_id.to_string()),
                challenge: None,
                error: None,
            };
            inner.challenge_epoch
        };

        let result = match self.client.get_pledge_challenge(pledge_id).await {
            Ok(response) if response.success => match response.challenge {
                Some(envelope) => Ok(envelope.decoded),
                None => Err(DashboardError::domain(
                    "Failed to fetch challenge",
                    None,
                    "response carried no challenge",
                )),
            },
            Ok(response) => Err(DashboardError::domain(
                "Failed to fetch challenge",
                response.error,
                "Unknown error",
            )),
            Err(e) => Err(e.into()),
        };

        let mut inner = self.write();
        if inner.challenge_epoch == epoch {
            let state = &mut inner.snapshot.challenge;
            state.loading = false;
            match &result {
                Ok(challenge) => state.challenge = Some(challenge.clone()),
                Err(e) => state.error = Some(e.to_string()),
            }
        }
        result
    }

    /// Re-fetch both queues and tell dependent views to refresh
    pub async fn after_approval(&self) -> PendingSnapshot {
        let snapshot = self.refresh().await;
        self.refresh_key.bump();
        snapshot
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
