use crate::stage::WorkflowStage;
use bridge_traits::CollectionId;
use thiserror::Error;

/// Failure of a single transfer attempt.
///
/// The workflow stays open after any of these; the user may retry or cancel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Transfer rejected: {0}")]
    Rejected(String),

    #[error("Transfer target not found: {0}")]
    NotFound(String),

    #[error("Transfer failed: {0}")]
    Transport(String),
}

impl TransferError {
    /// Whether resubmitting the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::Transport(_))
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Cannot leave {stage} stage: {reason}")]
    Validation {
        stage: WorkflowStage,
        reason: String,
    },

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Failed to load collections: {0}")]
    Fetch(String),

    #[error("No workflow is open")]
    NotOpen,

    #[error("A workflow is already open")]
    AlreadyOpen,

    #[error("A transfer is already in progress")]
    SubmissionInProgress,

    #[error("Unknown collection: {0}")]
    UnknownCollection(CollectionId),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TransferError::Transport("timeout".into()).is_retryable());
        assert!(!TransferError::Rejected("same collection".into()).is_retryable());
        assert!(!TransferError::NotFound("collection x".into()).is_retryable());
    }

    #[test]
    fn test_validation_message() {
        let err = WorkflowError::Validation {
            stage: WorkflowStage::Reviewing,
            reason: "select at least one record".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot leave reviewing stage: select at least one record"
        );
    }
}
