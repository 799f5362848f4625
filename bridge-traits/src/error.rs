use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the collaborator understood the request and refused it, as
    /// opposed to the request never reaching it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BridgeError::NotFound(_) | BridgeError::Rejected(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
