//! Error types for registry and note storage.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during registry or note store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No notepad with this id exists in the registry
    #[error("Notepad not found: {id}")]
    NotFound { id: String },

    /// The default notepad cannot be deleted
    #[error("Cannot delete the default notepad")]
    DefaultProtected,

    /// The id cannot be used as a file name
    #[error("Invalid notepad id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },

    /// I/O error from the data directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            StoreError::NotFound { id: "42".into() }.to_string(),
            "Notepad not found: 42"
        );
        assert_eq!(
            StoreError::DefaultProtected.to_string(),
            "Cannot delete the default notepad"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err = StoreError::from(std::io::Error::other("disk gone"));
        assert!(matches!(err, StoreError::Io(_)));
        assert!(err.to_string().contains("disk gone"));
    }
}
