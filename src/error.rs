//! Error types for AtlasDoc
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using AtlasError
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Unified error type for AtlasDoc operations
#[derive(Debug, Error)]
pub enum AtlasError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AtlasError {
    /// Wire status code for this error kind
    pub fn status(&self) -> u16 {
        match self {
            AtlasError::NotFound(_) => 404,
            AtlasError::AlreadyExists(_)
            | AtlasError::InvalidName(_)
            | AtlasError::InvalidPayload(_)
            | AtlasError::Protocol(_) => 400,
            AtlasError::Server { status, .. } => *status,
            AtlasError::Io(_) | AtlasError::Corrupt(_) | AtlasError::Config(_) => 500,
        }
    }

    /// Message safe to send to a remote client
    ///
    /// I/O errors can carry OS details, so they are reduced to a fixed string.
    pub fn public_message(&self) -> String {
        match self {
            AtlasError::Io(_) => "internal storage error".to_string(),
            AtlasError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// True if this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AtlasError::NotFound(_))
            || matches!(self, AtlasError::Server { status: 404, .. })
    }
}
