use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;

impl From<LibraryError> for BridgeError {
    fn from(error: LibraryError) -> Self {
        match error {
            LibraryError::NotFound { entity_type, id } => {
                BridgeError::NotFound(format!("{} {} not found", entity_type, id))
            }
            LibraryError::InvalidInput { field, message } => {
                BridgeError::Rejected(format!("{}: {}", field, message))
            }
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
