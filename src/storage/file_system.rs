use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::models::StoredCredentials;
use crate::error::StorageError;

const CREDENTIALS_FILE: &str = "credentials.json";

/// File-backed cache of the API key pair and the last bearer token
///
/// Read once at startup; written only after the backend has accepted the
/// credentials.
#[derive(Clone)]
pub struct CredentialStore {
    base_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    /// Create a store rooted at `base_path` (created lazily on first save)
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_path
    }

    fn credentials_path(&self) -> PathBuf {
        self.base_path.join(CREDENTIALS_FILE)
    }

    /// Load stored credentials, or empty credentials if nothing was saved yet
    pub fn load(&self) -> Result<StoredCredentials, StorageError> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(StoredCredentials::default());
        }
        let contents = fs::read_to_string(path)?;
        let credentials = serde_json::from_str(&contents)?;
        Ok(credentials)
    }

    /// Save the verified API key pair, keeping any cached token
    pub fn save_api_key(&self, api_user: &str, api_secret: &str) -> Result<(), StorageError> {
        self.update(|credentials| {
            credentials.api_user = Some(api_user.to_string());
            credentials.api_secret = Some(api_secret.to_string());
        })
    }

    /// Save the bearer token returned by `/authenticate`
    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.update(|credentials| {
            credentials.auth_token = Some(token.to_string());
        })
    }

    fn update(&self, apply: impl FnOnce(&mut StoredCredentials)) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut credentials = self.load()?;
        apply(&mut credentials);
        credentials.updated_at = Some(Utc::now());

        fs::create_dir_all(&self.base_path)?;
        let json = serde_json::to_string_pretty(&credentials)?;
        fs::write(self.credentials_path(), json)?;
        log::debug!("Credentials written to {:?}", self.credentials_path());
        Ok(())
    }
}
