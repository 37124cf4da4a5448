//! API credential lifecycle
//!
//! Credentials are loaded at startup and only written after the backend has
//! accepted them.

use crate::client::ApiClient;
use crate::error::DashboardError;
use crate::storage::{CredentialStore, StoredCredentials};

#[derive(Clone)]
pub struct Session {
    client: ApiClient,
    store: CredentialStore,
}

impl Session {
    pub fn new(client: ApiClient, store: CredentialStore) -> Self {
        Self {
            client: client.with_credential_store(store.clone()),
            store,
        }
    }

    pub fn load(&self) -> Result<StoredCredentials, DashboardError> {
        let credentials = self.store.load()?;
        if credentials.has_api_key() {
            log::info!("Loaded stored API credentials from {:?}", self.store.base_dir());
        }
        Ok(credentials)
    }

    /// Authenticate with `api_user` / `api_secret`, then persist them
    ///
    /// Storage is left untouched when the backend rejects the pair.
    pub async fn verify_and_save(
        &self,
        api_user: &str,
        api_secret: &str,
    ) -> Result<StoredCredentials, DashboardError> {
        if api_user.trim().is_empty() || api_secret.trim().is_empty() {
            return Err(DashboardError::Validation(
                "API user and API secret are both required".to_string(),
            ));
        }

        let result = self
            .client
            .authenticate(Some(api_user), Some(api_secret))
            .await;
        if !result.success {
            return Err(DashboardError::domain(
                "Authentication failed",
                result.error,
                "Please check your API credentials and try again.",
            ));
        }

        self.store.save_api_key(api_user, api_secret)?;
        log::info!("API credentials verified and saved");
        Ok(self.store.load()?)
    }
}
