//! Error types for docbridge

use thiserror::Error;

#[cfg(feature = "mongodb-errors")]
use std::sync::Arc;

/// Result type alias for docbridge operations
pub type Result<T> = std::result::Result<T, DocBridgeError>;

/// Unified error type for all docbridge operations
#[derive(Error, Debug, Clone)]
pub enum DocBridgeError {
    /// `connect` was called while a connection exists or is being established
    #[error("DB already connected")]
    AlreadyConnected,

    /// An operation needing a live connection was called without one
    #[error("DB not available")]
    NotAvailable,

    /// Error raised by the MongoDB driver, carried as-is
    #[cfg(feature = "mongodb-errors")]
    #[error(transparent)]
    MongoDB(Arc<mongodb::error::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DocBridgeError {
    /// Returns true if the error was raised by the facade itself rather than the driver
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DocBridgeError::AlreadyConnected | DocBridgeError::NotAvailable
        )
    }

    /// The underlying driver error, for matching on its `ErrorKind`
    #[cfg(feature = "mongodb-errors")]
    pub fn driver_error(&self) -> Option<&mongodb::error::Error> {
        match self {
            DocBridgeError::MongoDB(err) => Some(err),
            _ => None,
        }
    }
}

// Driver errors compare by their rendered message; the driver type has no PartialEq.
impl PartialEq for DocBridgeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DocBridgeError::AlreadyConnected, DocBridgeError::AlreadyConnected) => true,
            (DocBridgeError::NotAvailable, DocBridgeError::NotAvailable) => true,
            #[cfg(feature = "mongodb-errors")]
            (DocBridgeError::MongoDB(a), DocBridgeError::MongoDB(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            (DocBridgeError::Validation(a), DocBridgeError::Validation(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for DocBridgeError {
    fn from(err: mongodb::error::Error) -> Self {
        DocBridgeError::MongoDB(Arc::new(err))
    }
}
