use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the backend API client.
///
/// Callers should treat the message as human-readable text only; the backend
/// does not provide structured error codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend could not be reached at all.
    #[error("{0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The configured base URL cannot carry endpoint paths.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// The backend answered 2xx but the body could not be decoded.
    #[error("Server returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum DashboardError {
    /// Operator input was missing or malformed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend answered `success: false`.
    #[error("{context}: {reason}")]
    Domain { context: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation was attempted from the wrong workflow stage.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DashboardError {
    pub fn domain(context: impl Into<String>, reason: Option<String>, fallback: &str) -> Self {
        DashboardError::Domain {
            context: context.into(),
            reason: reason.unwrap_or_else(|| fallback.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    /// HTTP status the operator gateway answers with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            DashboardError::Domain { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::InvalidState(_) => StatusCode::CONFLICT,
            DashboardError::Api(ApiError::Network(_)) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::Api(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
