//! Error kinds returned by the Misskey client.

use mastokey_common::AppError;
use serde::Deserialize;

/// Error code Misskey uses when a user lookup matches nothing.
pub const NO_SUCH_USER: &str = "NO_SUCH_USER";

/// Error code Misskey uses when request parameters fail its schema.
pub const INVALID_PARAM: &str = "INVALID_PARAM";

/// Error type for Misskey client operations.
///
/// Callers branch on the variant, never on the message text.
#[derive(Debug, thiserror::Error)]
pub enum MisskeyError {
    /// The requested user does not exist on the remote server.
    #[error("Record not found")]
    NotFound,

    /// The account handle is not something the remote server accepts.
    #[error("{0}")]
    InvalidHandle(String),

    /// The remote server answered with an error body.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never completed.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote server answered with something we could not decode.
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl MisskeyError {
    /// Returns the remote error code, if the server sent one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Misskey error envelope: `{"error": {"message", "code", "id"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl MisskeyError {
    /// Builds an error from a non-success response.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) if envelope.error.code.as_deref() == Some(NO_SUCH_USER) => Self::NotFound,
            Ok(envelope) => Self::Api {
                status,
                message: envelope
                    .error
                    .message
                    .unwrap_or_else(|| format!("remote server returned {status}")),
                code: envelope.error.code,
            },
            Err(_) => Self::Api {
                status,
                code: None,
                message: if body.is_empty() {
                    format!("remote server returned {status}")
                } else {
                    body.to_string()
                },
            },
        }
    }
}

impl From<MisskeyError> for AppError {
    fn from(err: MisskeyError) -> Self {
        match err {
            MisskeyError::NotFound => Self::NotFound("Record not found".to_string()),
            MisskeyError::InvalidHandle(message) => Self::InvalidHandle(message),
            MisskeyError::Api {
                status, message, ..
            } => Self::Remote { status, message },
            MisskeyError::Transport(e) => Self::Upstream(e.to_string()),
            MisskeyError::Decode(message) => Self::Upstream(message),
            MisskeyError::InvalidUrl(message) => Self::BadRequest(message),
        }
    }
}
