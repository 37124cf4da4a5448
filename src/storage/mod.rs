//! Local credential persistence
//!
//! - File system operations
//! - Stored credential model

mod file_system;
mod models;

pub use file_system::CredentialStore;
pub use models::StoredCredentials;
