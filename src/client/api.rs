use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::*;
use crate::config::DashboardConfig;
use crate::error::ApiError;
use crate::storage::CredentialStore;

/// HTTP client for the pledge backend
///
/// Every call sends JSON headers and keeps a cookie store so session cookies
/// set by the backend ride along on later requests. Errors are normalised into
/// [`ApiError`]; `success: false` bodies are returned as ordinary values.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    api_user: Option<String>,
    api_key: Option<String>,
    credentials: Option<CredentialStore>,
}

impl ApiClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(config.api_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{} ({})", config.api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.clone()));
        }

        Ok(Self {
            client,
            base_url,
            api_user: config.api_user.clone(),
            api_key: config.api_key.clone(),
            credentials: None,
        })
    }

    /// Persist the bearer token returned by `/authenticate` into `store`
    pub fn with_credential_store(mut self, store: CredentialStore) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Issue a request to the endpoint made of `segments` and decode the JSON
    /// response body as `T`
    ///
    /// Each segment is percent-encoded, so ids containing `/` or `?` stay
    /// inside their segment.
    pub async fn request<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.client.request(method, self.url(segments)?);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(&endpoint_label(segments), builder).await
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, segments, None).await
    }

    async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, segments, Some(body)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        log::debug!("Fetching API: {} on {}", endpoint, self.base_url);

        let response = builder.send().await.map_err(|e| {
            log::error!("API Error ({}): {}", endpoint, e);
            ApiError::Network(format!(
                "Network error: Could not connect to {}. Please check your API server is running.",
                endpoint
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("error")
                        .and_then(|e| e.as_str())
                        .filter(|e| !e.is_empty())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    format!("API request failed with status {}", status.as_u16())
                });
            log::warn!("API Error ({}): {} {}", endpoint, status.as_u16(), message);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            log::error!("API Error ({}): undecodable body: {}", endpoint, e);
            ApiError::InvalidResponse(e.to_string())
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Exchange an API key pair for a bearer token
    ///
    /// Missing arguments fall back to the configured `PLEDGE_API_USER` /
    /// `PLEDGE_API_KEY`. The body is read whatever the HTTP status, and
    /// transport failures are folded into `{success: false, error}`. The token
    /// is cached in the credential store on success; it is not attached to
    /// later requests.
    pub async fn authenticate(
        &self,
        api_user: Option<&str>,
        api_key: Option<&str>,
    ) -> AuthenticateResponse {
        let request = AuthenticateRequest {
            api_key_id: api_user.map(str::to_string).or_else(|| self.api_user.clone()),
            api_key_secret: api_key.map(str::to_string).or_else(|| self.api_key.clone()),
        };

        let result = async {
            let url = self.url(&["authenticate"]).map_err(|e| e.to_string())?;
            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| e.to_string())
        }
        .await;

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Authentication request failed: {}", e);
                return AuthenticateResponse {
                    success: false,
                    token: None,
                    error: Some(e),
                };
            }
        };

        let success = body.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
        let token = body
            .get("token")
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        match (success, token) {
            (true, Some(token)) => {
                if let Some(store) = &self.credentials {
                    if let Err(e) = store.save_token(&token) {
                        log::warn!("Failed to cache auth token: {}", e);
                    }
                }
                log::info!("Authenticated against {}", self.base_url);
                AuthenticateResponse {
                    success: true,
                    token: Some(token),
                    error: None,
                }
            }
            _ => AuthenticateResponse {
                success: false,
                token: None,
                error: Some(
                    body.get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("Authentication failed")
                        .to_string(),
                ),
            },
        }
    }

    pub async fn list_all_pledges(&self) -> Result<PledgeList, ApiError> {
        self.get(&["list-all-pledges"]).await
    }

    /// Pending requests filtered server-side by `type` and `status`
    pub async fn list_pending_requests(
        &self,
        request_type: &str,
        status: &str,
    ) -> Result<RequestList, ApiError> {
        let segments = ["list-pending-requests"];
        let builder = self
            .client
            .get(self.url(&segments)?)
            .query(&[("type", request_type), ("status", status)]);
        self.send(&endpoint_label(&segments), builder).await
    }

    pub async fn get_account(&self, account_id: &str) -> Result<AccountResponse, ApiError> {
        self.get(&["account", account_id]).await
    }

    pub async fn get_pledge_challenge(&self, pledge_id: &str) -> Result<PledgeChallenge, ApiError> {
        self.get(&["get-pledge-challenge", pledge_id]).await
    }

    pub async fn approve_pledge(
        &self,
        pledge_id: &str,
        request: &ApprovalRequest,
    ) -> Result<ApprovalResponse, ApiError> {
        self.post(&["approve-pledge", pledge_id], request).await
    }

    pub async fn get_pledge(&self, pledge_id: &str) -> Result<PledgeResponse, ApiError> {
        self.get(&["pledge", pledge_id]).await
    }

    pub async fn estimate_fees(
        &self,
        request: &FeeEstimationRequest,
    ) -> Result<FeeEstimationResponse, ApiError> {
        self.post(&["estimate-fees"], request).await
    }

    pub async fn create_settlement(
        &self,
        payload: &SettlementPayload,
    ) -> Result<CreateSettlementResponse, ApiError> {
        self.post(&["create-settlement"], payload).await
    }
}

/// `/a/b` form of an endpoint for log lines and error messages
fn endpoint_label(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}
