use uuid::Uuid;

use crate::approval::{ApprovalKind, ApprovalOutcome, ApprovalSubmitter};
use crate::client::{ApiClient, DecodedChallenge};
use crate::config::DashboardConfig;
use crate::dashboard::RefreshKey;
use crate::error::DashboardError;
use crate::pending::{PendingRequests, PendingSnapshot};
use crate::pledges::{PledgeBoard, PledgeRow};
use crate::session::Session;
use crate::settlement::{InboundRequest, OutboundRequest, SettlementDesk, SettlementDraft};
use crate::storage::{CredentialStore, StoredCredentials};

/// Dashboard Manager - Orchestration Layer
///
/// Owns one API client and wires every console workflow to it and to the
/// shared refresh key.
pub struct DashboardManager {
    pub config: DashboardConfig,
    session: Session,
    pending: PendingRequests,
    pledges: PledgeBoard,
    settlements: SettlementDesk,
    approvals: ApprovalSubmitter,
    refresh_key: RefreshKey,
}

impl DashboardManager {
    // ============================================================================
    // Constructor
    // ============================================================================

    pub fn new() -> Result<Self, DashboardError> {
        Self::with_config(DashboardConfig::from_env())
    }

    /// Create a manager from an explicit configuration (used by tests)
    pub fn with_config(config: DashboardConfig) -> Result<Self, DashboardError> {
        let store = CredentialStore::new(config.credentials_dir.clone());
        let client = ApiClient::new(&config)?.with_credential_store(store.clone());
        let refresh_key = RefreshKey::new();

        Ok(Self {
            session: Session::new(client.clone(), store),
            pending: PendingRequests::new(client.clone(), refresh_key.clone()),
            pledges: PledgeBoard::new(client.clone()),
            settlements: SettlementDesk::new(client.clone()),
            approvals: ApprovalSubmitter::new(client, config.approval_close_delay),
            refresh_key,
            config,
        })
    }

    pub fn refresh_key(&self) -> &RefreshKey {
        &self.refresh_key
    }

    // ============================================================================
    // Settings
    // ============================================================================

    pub fn stored_credentials(&self) -> Result<StoredCredentials, DashboardError> {
        self.session.load()
    }

    pub async fn save_credentials(
        &self,
        api_user: &str,
        api_secret: &str,
    ) -> Result<StoredCredentials, DashboardError> {
        self.session.verify_and_save(api_user, api_secret).await
    }

    // ============================================================================
    // Pledges and pending requests
    // ============================================================================

    pub async fn pledge_rows(&self) -> Result<Vec<PledgeRow>, DashboardError> {
        self.pledges.refresh().await
    }

    pub async fn pending_requests(&self) -> PendingSnapshot {
        self.pending.refresh().await
    }

    pub async fn open_challenge(
        &self,
        pledge_id: &str,
    ) -> Result<DecodedChallenge, DashboardError> {
        self.pending.open_challenge(pledge_id).await
    }

    /// Full dashboard refresh: drop cached accounts and bump the refresh key
    pub fn refresh_all(&self) -> u64 {
        self.pledges.invalidate();
        self.refresh_key.bump()
    }

    // ============================================================================
    // Approvals
    // ============================================================================

    /// Submit an approval; on success, after the configured delay, cached
    /// accounts are dropped, the pending queues re-fetched and the refresh key
    /// bumped
    pub async fn approve(
        &self,
        target_id: &str,
        private_key: &str,
        kind: ApprovalKind,
    ) -> Result<ApprovalOutcome, DashboardError> {
        let pending = self.pending.clone();
        let pledges = self.pledges.clone();
        self.approvals
            .submit_and_schedule(target_id, private_key, kind, move || async move {
                pledges.invalidate();
                pending.after_approval().await;
            })
            .await
    }

    // ============================================================================
    // Settlements
    // ============================================================================

    pub async fn prepare_outbound(
        &self,
        request: &OutboundRequest,
    ) -> Result<SettlementDraft, DashboardError> {
        self.settlements.prepare_outbound(request).await
    }

    pub async fn prepare_inbound(
        &self,
        request: &InboundRequest,
    ) -> Result<SettlementDraft, DashboardError> {
        self.settlements.prepare_inbound(request).await
    }

    pub async fn confirm_settlement(&self, settlement_id: Uuid) -> Result<Uuid, DashboardError> {
        self.settlements.confirm(settlement_id).await
    }

    pub fn discard_settlement(&self, settlement_id: Uuid) -> Result<(), DashboardError> {
        self.settlements.discard(settlement_id)
    }
}
