//! Prepared settlements awaiting confirmation, keyed by settlement id
//!
//! A flow is taken out of the map while it is being confirmed and only put
//! back if the submission failed; confirmed payloads are dropped. The operator
//! can discard a draft, and once more than `capacity` drafts are parked the
//! oldest one is evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::flow::{SettlementDraft, SettlementFlow};
use super::payload::{InboundRequest, OutboundRequest};
use crate::client::ApiClient;
use crate::error::DashboardError;

pub const MAX_PARKED_DRAFTS: usize = 32;

struct Parked {
    flow: SettlementFlow,
    sequence: u64,
}

#[derive(Default)]
struct Drafts {
    parked: HashMap<Uuid, Parked>,
    next_sequence: u64,
}

#[derive(Clone)]
pub struct SettlementDesk {
    client: ApiClient,
    capacity: usize,
    drafts: Arc<Mutex<Drafts>>,
}

impl SettlementDesk {
    pub fn new(client: ApiClient) -> Self {
        Self::with_capacity(client, MAX_PARKED_DRAFTS)
    }

    pub fn with_capacity(client: ApiClient, capacity: usize) -> Self {
        Self {
            client,
            capacity: capacity.max(1),
            drafts: Arc::new(Mutex::new(Drafts::default())),
        }
    }

    pub async fn prepare_outbound(
        &self,
        request: &OutboundRequest,
    ) -> Result<SettlementDraft, DashboardError> {
        let mut flow = SettlementFlow::new(self.client.clone());
        let draft = flow.prepare_outbound(request).await?;
        self.park(draft.settlement_id, flow);
        Ok(draft)
    }

    pub async fn prepare_inbound(
        &self,
        request: &InboundRequest,
    ) -> Result<SettlementDraft, DashboardError> {
        let mut flow = SettlementFlow::new(self.client.clone());
        let draft = flow.prepare_inbound(request).await?;
        self.park(draft.settlement_id, flow);
        Ok(draft)
    }

    pub async fn confirm(&self, settlement_id: Uuid) -> Result<Uuid, DashboardError> {
        let mut flow = self
            .lock()
            .parked
            .remove(&settlement_id)
            .map(|parked| parked.flow)
            .ok_or_else(|| not_found(settlement_id))?;

        match flow.confirm().await {
            Ok(id) => Ok(id),
            Err(e) => {
                self.park(settlement_id, flow);
                Err(e)
            }
        }
    }

    pub fn draft(&self, settlement_id: Uuid) -> Option<SettlementDraft> {
        self.lock()
            .parked
            .get(&settlement_id)
            .and_then(|parked| parked.flow.draft().cloned())
    }

    /// Drop a prepared settlement without submitting it
    pub fn discard(&self, settlement_id: Uuid) -> Result<(), DashboardError> {
        match self.lock().parked.remove(&settlement_id) {
            Some(_) => {
                log::info!("Discarded settlement {}", settlement_id);
                Ok(())
            }
            None => Err(not_found(settlement_id)),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock().parked.len()
    }

    fn park(&self, settlement_id: Uuid, flow: SettlementFlow) {
        let mut drafts = self.lock();
        let sequence = drafts.next_sequence;
        drafts.next_sequence += 1;
        drafts.parked.insert(settlement_id, Parked { flow, sequence });

        while drafts.parked.len() > self.capacity {
            let oldest = drafts
                .parked
                .iter()
                .min_by_key(|(_, parked)| parked.sequence)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    drafts.parked.remove(&id);
                    log::warn!("Evicted unconfirmed settlement {}", id);
                }
                None => break,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Drafts> {
        self.drafts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn not_found(settlement_id: Uuid) -> DashboardError {
    DashboardError::NotFound(format!("settlement {}", settlement_id))
}
