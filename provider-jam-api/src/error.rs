//! Error types for the collections API provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Collections API errors
#[derive(Error, Debug)]
pub enum JamApiError {
    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request failed validation on the server (400/422)
    #[error("Request rejected (status {status_code}): {message}")]
    Rejected { status_code: u16, message: String },

    /// Any other non-success status
    #[error("Collections API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for collections API operations
pub type Result<T> = std::result::Result<T, JamApiError>;

impl From<JamApiError> for BridgeError {
    fn from(error: JamApiError) -> Self {
        match error {
            JamApiError::NotFound(msg) => BridgeError::NotFound(msg),
            JamApiError::Rejected { message, .. } => BridgeError::Rejected(message),
            JamApiError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            JamApiError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            JamApiError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = JamApiError::ApiError {
            status_code: 500,
            message: "Failed to move companies".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Collections API error (status 500): Failed to move companies"
        );
    }

    #[test]
    fn test_error_conversion() {
        let rejected: BridgeError = JamApiError::Rejected {
            status_code: 422,
            message: "company_ids cannot be empty".to_string(),
        }
        .into();
        assert!(matches!(rejected, BridgeError::Rejected(_)));

        let missing: BridgeError = JamApiError::NotFound("collection x".to_string()).into();
        assert!(matches!(missing, BridgeError::NotFound(_)));

        let server: BridgeError = JamApiError::ApiError {
            status_code: 503,
            message: String::new(),
        }
        .into();
        assert!(matches!(server, BridgeError::OperationFailed(_)));
    }
}
