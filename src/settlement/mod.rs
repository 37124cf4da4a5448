//! Settlement building
//!
//! - Payload assembly
//! - Preparation/confirmation state machine
//! - Drafts awaiting confirmation

pub mod desk;
pub mod flow;
pub mod payload;

pub use desk::{SettlementDesk, MAX_PARKED_DRAFTS};
pub use flow::{SettlementDraft, SettlementFlow, SettlementStage};
pub use payload::{InboundRequest, OutboundRequest, SettlementKind};
