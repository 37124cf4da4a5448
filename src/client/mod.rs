// Backend API integration
// Provides the HTTP client and wire types for the pledge backend

pub mod api;
pub mod types;

pub use api::ApiClient;
pub use types::*;
