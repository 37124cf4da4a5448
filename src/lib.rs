//! Pledge Admin: operator console for a custody backend
//!
//! Talks to the custody backend's HTTP API to review pledges, approve
//! pending pledge increments and settlements with a signed challenge, and
//! build outbound/inbound settlements from a pledge.
//!
//! # Architecture
//!
//! - **Client**: typed HTTP client for the backend endpoints
//! - **Workflows**: pending requests, approvals, pledge board, settlements
//! - **Gateway**: axum server exposing the workflows to the operator UI

pub mod api;
pub mod approval;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod manager;
pub mod pending;
pub mod pledges;
pub mod session;
pub mod settlement;
pub mod storage;
pub mod units;

pub use approval::{ApprovalKind, ApprovalOutcome, ApprovalSubmitter};
pub use client::ApiClient;
pub use config::DashboardConfig;
pub use dashboard::RefreshKey;
pub use error::{ApiError, DashboardError, StorageError};
pub use manager::DashboardManager;
pub use pending::{ListState, PendingRequests, PendingSnapshot};
pub use pledges::{AccountCache, PledgeBoard, PledgeRow};
pub use session::Session;
pub use settlement::{
    InboundRequest, OutboundRequest, SettlementDesk, SettlementDraft, SettlementFlow,
    SettlementKind, SettlementStage,
};
pub use storage::{CredentialStore, StoredCredentials};

pub type Result<T> = std::result::Result<T, DashboardError>;
