/// Custody Backend Mock Server Library
///
/// In-memory stand-in for the pledge custody backend. Serves the same JSON
/// shapes as the real API, records every call, and lets tests inject
/// `success: false` answers, HTTP failures and delays per endpoint.

pub mod handlers;
pub mod server;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use server::{create_router, run_server, spawn};
pub use store::{Endpoint, Failure, FeeQuote, MockBackend, RecordedCall, DEFAULT_MAX_FEES};
pub use types::*;
