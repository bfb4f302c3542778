//! Error types for the Vigil target registry.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("healthcheck {0} not found")]
    NotFound(String),

    #[error("endpoint {0} already registered")]
    AlreadyRegistered(String),

    #[error("snapshot io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}

impl RegistryError {
    /// Whether this error is a missing snapshot file rather than a real failure.
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            RegistryError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
