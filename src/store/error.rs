//! Store Errors
//!
//! Failures of the key-value adapter. Every variant names the operation and
//! key involved so callers can tell which write of a transfer failed.

/// Errors that can occur talking to the key-value store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Command rejected or transport failure
    #[error("{operation} on {key} failed: {source}")]
    Command {
        operation: &'static str,
        key: String,
        #[source]
        source: redis::RedisError,
    },

    /// Command did not complete within the configured deadline
    #[error("{operation} on {key} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        key: String,
        timeout_ms: u64,
    },

    /// Could not establish a connection
    #[error("Store connection error: {0}")]
    Connection(String),

    /// Key holds a value of another type
    #[error("{key} holds the wrong kind of value")]
    WrongType { key: String },

    /// Increment against a value that is not a number
    #[error("{key} does not hold a number")]
    NotANumber { key: String },

    /// Store refused the write (in-memory store failure injection)
    #[error("{operation} on {key} failed: store unavailable")]
    Unavailable { operation: &'static str, key: String },
}

impl StoreError {
    /// Key the failing operation targeted, when there is one
    pub fn key(&self) -> Option<&str> {
        match self {
            StoreError::Command { key, .. }
            | StoreError::Timeout { key, .. }
            | StoreError::WrongType { key }
            | StoreError::NotANumber { key }
            | StoreError::Unavailable { key, .. } => Some(key),
            StoreError::Connection(_) => None,
        }
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }
}
