//! Session error types.

use crate::api::ApiError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the session manager
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Caller supplied empty or malformed input
    #[error("{0}")]
    InvalidInput(String),

    /// Remote API failure
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Persistent store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Operation needs an authenticated session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Refresh requested with no refresh token stored
    #[error("No refresh token available")]
    NoRefreshToken,
}

impl SessionError {
    /// User-visible message, the single normalized string exposed to the UI.
    ///
    /// Transport and storage details never leak through this message.
    pub fn client_message(&self) -> String {
        match self {
            SessionError::InvalidInput(msg) => msg.clone(),
            SessionError::Api(api) => match api {
                ApiError::Unauthorized { .. } => "Invalid email or password".to_string(),
                ApiError::Forbidden { .. } => "Your account has been deactivated".to_string(),
                ApiError::Conflict { .. } => {
                    "An account with this email already exists".to_string()
                }
                ApiError::Timeout | ApiError::Network(_) => {
                    "Unable to reach the server. Please check your connection.".to_string()
                }
                ApiError::MalformedResponse(_) => "Invalid token format in response".to_string(),
                ApiError::Status { message, .. } => message
                    .clone()
                    .unwrap_or_else(|| "Request failed. Please try again.".to_string()),
            },
            SessionError::Storage(_) => "Unable to save your session on this device".to_string(),
            SessionError::NotAuthenticated => "Please log in to continue".to_string(),
            SessionError::NoRefreshToken => "Your session has expired. Please log in again.".to_string(),
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_message_hides_server_detail() {
        let err = SessionError::from(ApiError::Unauthorized {
            message: Some("user row 42 password mismatch".to_string()),
        });
        assert_eq!(err.client_message(), "Invalid email or password");
    }

    #[test]
    fn test_forbidden_message() {
        let err = SessionError::from(ApiError::Forbidden { message: None });
        assert_eq!(err.client_message(), "Your account has been deactivated");
    }

    #[test]
    fn test_network_and_timeout_share_message() {
        let net = SessionError::from(ApiError::Network("connection refused".to_string()));
        let timeout = SessionError::from(ApiError::Timeout);
        assert_eq!(net.client_message(), timeout.client_message());
        assert!(!net.client_message().contains("refused"));
    }

    #[test]
    fn test_status_uses_server_message() {
        let err = SessionError::from(ApiError::Status {
            status: 422,
            message: Some("Password too short".to_string()),
        });
        assert_eq!(err.client_message(), "Password too short");
    }
}
