use serde::Deserialize;
use thiserror::Error;

/// Message used when a failed response carries no `message` of its own
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Status reported when the request never reached the server
pub const NETWORK_FAILURE_STATUS: u16 = 0;

// ============================================================================
// Normalized response
// ============================================================================

/// Uniform result of every API call.
///
/// Exactly one of data or error is present; the status is always present and
/// is `0` when the server was never reached.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Data { data: T, status: u16 },
    Error { error: String, status: u16 },
}

impl<T> ApiResponse<T> {
    pub fn network_failure(message: impl Into<String>) -> Self {
        ApiResponse::Error {
            error: message.into(),
            status: NETWORK_FAILURE_STATUS,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiResponse::Data { status, .. } | ApiResponse::Error { status, .. } => *status,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Data { data, .. } => Some(data),
            ApiResponse::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApiResponse::Data { .. } => None,
            ApiResponse::Error { error, .. } => Some(error.as_str()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Data { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            ApiResponse::Data { data, status } => ApiResponse::Data {
                data: f(data),
                status,
            },
            ApiResponse::Error { error, status } => ApiResponse::Error { error, status },
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Data { data, .. } => Ok(data),
            ApiResponse::Error { error, status } if status == NETWORK_FAILURE_STATUS => {
                Err(ApiError::Network(error))
            }
            ApiResponse::Error { error, status } => Err(ApiError::Server {
                status,
                message: error,
            }),
        }
    }
}

// ============================================================================
// Error type
// ============================================================================

/// A failed API call, split by whether the server was reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Network(_) => NETWORK_FAILURE_STATUS,
            ApiError::Server { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Network(message) | ApiError::Server { message, .. } => message,
        }
    }
}

// ============================================================================
// Error body
// ============================================================================

/// Shape of an error body; only `message` is read.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

/// Extract the server's message from a failed response body.
pub(crate) fn error_message(body: &[u8]) -> String {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .and_then(|m| match m {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::Array(items) if !items.is_empty() => Some(
                items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        });

    message.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}
