//! Error types for mastokey.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// Every variant renders as a Mastodon-style error body. Binding failures
/// carry the offending field name and render as `{"field", "error"}`; all
/// other variants render as `{"error"}`.
#[derive(Debug, Error)]
pub enum AppError {
    // === Credential Errors ===
    #[error("Authorization header is required")]
    MissingCredential,

    #[error("Authorization header must be Bearer")]
    MalformedCredential,

    // === Client Errors ===
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Binding { field: String, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidHandle(String),

    #[error("{0}")]
    NotFound(String),

    // === Remote Errors ===
    /// An error response from the remote server, forwarded as-is.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The remote server could not be reached or answered with garbage.
    #[error("Upstream error: {0}")]
    Upstream(String),

    // === Server Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::MalformedCredential => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_)
            | Self::Binding { .. }
            | Self::Validation(_)
            | Self::InvalidHandle(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Remote { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code used in logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::MalformedCredential => "MALFORMED_CREDENTIAL",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Binding { .. } => "BINDING_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidHandle(_) => "INVALID_HANDLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Remote { .. } => "REMOTE_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Builds the JSON body sent to the client.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Binding { field, message } => json!({
                "field": field,
                "error": message,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        (status, Json(self.body())).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
