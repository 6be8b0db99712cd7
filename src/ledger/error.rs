//! Ledger Errors

use crate::domain::DomainError;
use crate::store::StoreError;

/// Errors returned by the ledger engine
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Direction text not recognized; nothing was written
    #[error("invalid direction {0:?}")]
    InvalidDirection(String),

    /// Malformed request (identifiers, precision); nothing was written
    #[error("invalid request: {0}")]
    InvalidRequest(DomainError),

    /// Store failure, returned verbatim from the first failing call
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored numeric field could not be parsed
    #[error("cannot parse {field} of {key} (value {value:?})")]
    Parse {
        key: String,
        field: &'static str,
        value: String,
    },

    /// Journal replay produced a total outside the representable range
    #[error("journal replay overflowed at entry {sequence} for {till}/{tender}")]
    Overflow {
        sequence: u64,
        till: String,
        tender: String,
    },

    /// Journal entry could not be encoded or decoded
    #[error("journal serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidDirection(direction) => LedgerError::InvalidDirection(direction),
            other => LedgerError::InvalidRequest(other),
        }
    }
}

impl LedgerError {
    pub fn parse(key: impl Into<String>, field: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            key: key.into(),
            field,
            value: value.into(),
        }
    }

    pub fn overflow(sequence: u64, till: &str, tender: &str) -> Self {
        Self::Overflow {
            sequence,
            till: till.to_string(),
            tender: tender.to_string(),
        }
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDirection(_) | Self::InvalidRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_error_maps_to_own_variant() {
        let err: LedgerError = DomainError::InvalidDirection("x".to_string()).into();
        assert!(matches!(err, LedgerError::InvalidDirection(ref d) if d == "x"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_identifier_error_maps_to_invalid_request() {
        let err: LedgerError = DomainError::invalid_identifier("till", "").into();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_parse_error_names_key_and_field() {
        let err = LedgerError::parse("k:denomination:quarter", "count", "abc");
        assert!(!err.is_client_error());
        let message = err.to_string();
        assert!(message.contains("count"));
        assert!(message.contains("k:denomination:quarter"));
    }

    #[test]
    fn test_overflow_names_entry_and_tender() {
        let err = LedgerError::overflow(7, "till-2", "cash");
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "journal replay overflowed at entry 7 for till-2/cash");
    }
}
