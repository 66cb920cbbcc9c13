//! Error types for Sealnote core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for Sealnote operations.
pub type Result<T> = std::result::Result<T, SealnoteError>;

/// Core error type for Sealnote operations.
#[derive(Debug, Error)]
pub enum SealnoteError {
    /// Wrong password (safe to retry)
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// No password has been configured for this installation
    #[error("No password configured; run first-time setup")]
    NotInitialized,

    /// Authenticated decryption failed: wrong key, corrupted or truncated bytes
    #[error("Decryption failed: data was tampered with or the key is wrong")]
    TamperedOrWrongKey,

    /// Envelope is not decodable or shorter than nonce + tag
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Operation on an unknown note id
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Store operation attempted without an unlocked key
    #[error("Store is locked")]
    Locked,

    /// Method migration attempted without valid prior verification
    #[error("Migration precondition failed: {0}")]
    MigrationPrecondition(String),

    /// Key derivation or cipher setup error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Data or state validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Directory watch could not be established
    #[error("Watch error: {0}")]
    Watch(String),

    /// I/O error on read, write, rename or remove
    #[error("File system error: {source}")]
    FileSystem {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl SealnoteError {
    /// True for per-record failures that a bulk load should skip rather than abort on.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            SealnoteError::TamperedOrWrongKey
                | SealnoteError::MalformedEnvelope(_)
                | SealnoteError::Json { .. }
                | SealnoteError::Validation(_)
        )
    }
}

impl From<notify::Error> for SealnoteError {
    fn from(err: notify::Error) -> Self {
        SealnoteError::Watch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_file_system() {
        let err: SealnoteError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, SealnoteError::FileSystem { .. }));
        assert!(!err.is_record_level());
    }

    #[test]
    fn test_record_level_classification() {
        assert!(SealnoteError::TamperedOrWrongKey.is_record_level());
        assert!(SealnoteError::MalformedEnvelope("short".to_string()).is_record_level());
        assert!(!SealnoteError::AuthenticationFailed.is_record_level());
        assert!(!SealnoteError::NotFound("abc".to_string()).is_record_level());
    }
}
