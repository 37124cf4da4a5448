/// Console configuration from environment variables
///
/// Controls the backend API endpoint, fallback API credentials, where the
/// verified credentials are cached, and the operator gateway bind address.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";
pub const DEFAULT_CREDENTIALS_DIR: &str = "./.pledge-admin";
pub const DEFAULT_APPROVAL_CLOSE_DELAY_MS: u64 = 2000;

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Backend API base URL (no trailing slash)
    pub api_url: String,
    /// Fallback API key id used when authenticate is called without one
    pub api_user: Option<String>,
    /// Fallback API key secret used when authenticate is called without one
    pub api_key: Option<String>,
    /// Directory holding `credentials.json`
    pub credentials_dir: PathBuf,
    /// Address the operator gateway listens on
    pub bind_address: String,
    /// How long a successful approval stays visible before close-and-refresh
    pub approval_close_delay: Duration,
}

impl DashboardConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PLEDGE_API_URL`: backend base URL (default `http://127.0.0.1:8000`)
    /// - `PLEDGE_API_USER` / `PLEDGE_API_KEY`: fallback credentials for `/authenticate`
    /// - `PLEDGE_CREDENTIALS_DIR`: credential cache directory (default `./.pledge-admin`)
    /// - `PLEDGE_ADMIN_BIND`: gateway bind address (default `127.0.0.1:3001`)
    /// - `APPROVAL_CLOSE_DELAY_MS`: post-approval delay in milliseconds (default 2000)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Point at a local mock backend
    /// PLEDGE_API_URL=http://localhost:8000 cargo run
    /// ```
    pub fn from_env() -> Self {
        let api_url = env::var("PLEDGE_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| {
                log::info!("📡 PLEDGE_API_URL not set, using {}", DEFAULT_API_URL);
                DEFAULT_API_URL.to_string()
            });
        log::info!("📡 Backend API: {}", api_url);

        let api_user = env::var("PLEDGE_API_USER").ok().filter(|v| !v.is_empty());
        let api_key = env::var("PLEDGE_API_KEY").ok().filter(|v| !v.is_empty());

        let credentials_dir = env::var("PLEDGE_CREDENTIALS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CREDENTIALS_DIR));

        let bind_address =
            env::var("PLEDGE_ADMIN_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());

        let approval_close_delay = match env::var("APPROVAL_CLOSE_DELAY_MS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    log::warn!(
                        "⚠️  Invalid APPROVAL_CLOSE_DELAY_MS '{}', using {} ms",
                        raw,
                        DEFAULT_APPROVAL_CLOSE_DELAY_MS
                    );
                    Duration::from_millis(DEFAULT_APPROVAL_CLOSE_DELAY_MS)
                }
            },
            Err(_) => Duration::from_millis(DEFAULT_APPROVAL_CLOSE_DELAY_MS),
        };

        Self {
            api_url,
            api_user,
            api_key,
            credentials_dir,
            bind_address,
            approval_close_delay,
        }
    }

    /// Configuration pointing at an explicit backend, everything else default
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            ..Default::default()
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_user: None,
            api_key: None,
            credentials_dir: PathBuf::from(DEFAULT_CREDENTIALS_DIR),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            approval_close_delay: Duration::from_millis(DEFAULT_APPROVAL_CLOSE_DELAY_MS),
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
