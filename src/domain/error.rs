//! Domain Error Types
//!
//! Validation failures for ledger requests. None of these depend on the store.

use thiserror::Error;

/// Errors raised while validating a ledger request.
///
/// All of them are detected before the first store mutation is issued.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Direction text is neither forward nor reverse
    #[error("invalid direction {0:?}")]
    InvalidDirection(String),

    /// Identifier is empty or contains the key delimiter
    #[error("invalid {field}: {value:?} (must be non-empty and must not contain ':')")]
    InvalidIdentifier { field: &'static str, value: String },

    /// Amount carries more precision than the ledger keeps
    #[error("invalid amount for {field}: {reason}")]
    InvalidAmount { field: String, reason: String },
}

impl DomainError {
    pub fn invalid_identifier(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            field,
            value: value.into(),
        }
    }

    pub fn invalid_amount(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
