use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Message shown when the server cannot be reached at all.
pub const CONNECTIVITY_MESSAGE: &str = "Unable to connect to server. Please check your connection.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// The transport never got a response.
    #[error("{message}")]
    Connectivity {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// 401 or 403. Persisted session state has already been cleared when
    /// this is returned; the shell must reset itself.
    #[error("Session is no longer authorized")]
    Unauthorized,

    /// The endpoint URL could not be built from the base URL.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A success body did not have the shape the caller asked for.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    pub fn connectivity(source: reqwest::Error) -> Self {
        ApiError::Connectivity {
            message: CONNECTIVITY_MESSAGE.to_string(),
            source,
        }
    }

    /// Build an application error from a non-success status and its raw
    /// body: `{"error":{"message":..}}` when present, otherwise
    /// `HTTP <status>: <reason>`.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
            });
        ApiError::Application {
            status: status.as_u16(),
            message,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 401 and 403 both end the session.
pub fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
