//! Remote API error types.

use thiserror::Error;

/// Errors returned by the authentication API layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401 from the backend
    #[error("Unauthorized")]
    Unauthorized { message: Option<String> },

    /// 403 from the backend
    #[error("Forbidden")]
    Forbidden { message: Option<String> },

    /// 409 from the backend
    #[error("Conflict")]
    Conflict { message: Option<String> },

    /// Any other non-2xx status
    #[error("HTTP {status}")]
    Status { status: u16, message: Option<String> },

    /// Request exceeded the client timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection failure or other transport error
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx response that did not carry the expected fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Build an error from a non-2xx status and the server's message, if any
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => ApiError::Unauthorized { message },
            403 => ApiError::Forbidden { message },
            409 => ApiError::Conflict { message },
            _ => ApiError::Status { status, message },
        }
    }

    /// Message supplied by the server in the error body
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::Conflict { message }
            | ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::MalformedResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
