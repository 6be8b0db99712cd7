//! Ledger address
//!
//! The (organization, enterprise unit, settlement document) triple that scopes
//! every key of one ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// Key delimiter. Identifiers must never contain it, otherwise two distinct
/// addresses could format to the same key.
pub const KEY_DELIMITER: char = ':';

/// Scope of one settlement ledger.
///
/// Immutable once constructed; all storage keys are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerAddress {
    organization: String,
    enterprise_unit: String,
    settlement_doc_id: String,
}

impl LedgerAddress {
    pub fn new(
        organization: impl Into<String>,
        enterprise_unit: impl Into<String>,
        settlement_doc_id: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            enterprise_unit: enterprise_unit.into(),
            settlement_doc_id: settlement_doc_id.into(),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn enterprise_unit(&self) -> &str {
        &self.enterprise_unit
    }

    /// Settlement document (business period) this ledger belongs to
    pub fn settlement_doc_id(&self) -> &str {
        &self.settlement_doc_id
    }

    /// Check that every component is a usable key segment.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_identifier("organization", &self.organization)?;
        validate_identifier("enterprise_unit", &self.enterprise_unit)?;
        validate_identifier("settlement_doc_id", &self.settlement_doc_id)
    }
}

impl fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.organization, self.enterprise_unit, self.settlement_doc_id
        )
    }
}

/// Reject identifiers that would break key injectivity.
pub(crate) fn validate_identifier(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() || value.contains(KEY_DELIMITER) {
        return Err(DomainError::invalid_identifier(field, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let address = LedgerAddress::new("test-org", "test-eu", "settlement-id-1");
        assert!(address.validate().is_ok());
        assert_eq!(address.organization(), "test-org");
        assert_eq!(address.to_string(), "test-org/test-eu/settlement-id-1");
    }

    #[test]
    fn test_empty_component_rejected() {
        let address = LedgerAddress::new("test-org", "", "s1");
        assert_eq!(
            address.validate(),
            Err(DomainError::invalid_identifier("enterprise_unit", ""))
        );
    }

    #[test]
    fn test_delimiter_rejected() {
        let address = LedgerAddress::new("org:evil", "eu", "s1");
        assert!(matches!(
            address.validate(),
            Err(DomainError::InvalidIdentifier { field: "organization", .. })
        ));
    }

    #[test]
    fn test_spaces_allowed() {
        assert!(validate_identifier("denomination", "dollar bill").is_ok());
    }
}
