//! Transfer requests
//!
//! A `Transaction` moves tenders from a source till to a destination till.
//! It is never stored as an entity; only its effect on balances (and,
//! optionally, a journal entry) survives.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::address::validate_identifier;
use super::amount::{validate_magnitude, validate_scale};
use super::{DomainError, LedgerAddress};

/// Sign convention applied to every delta of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Source pays destination (`>`)
    Forward,
    /// Destination pays source (`<`)
    Reverse,
}

impl Direction {
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    /// Apply the sign to a decimal delta.
    pub fn signed(self, value: Decimal) -> Decimal {
        match self {
            Direction::Forward => value,
            Direction::Reverse => -value,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => ">",
            Direction::Reverse => "<",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Direction::Forward),
            "<" => Ok(Direction::Reverse),
            other if other.eq_ignore_ascii_case("forward") => Ok(Direction::Forward),
            other if other.eq_ignore_ascii_case("reverse") => Ok(Direction::Reverse),
            other => Err(DomainError::InvalidDirection(other.to_string())),
        }
    }
}

/// Change to one denomination of a tender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenominationDelta {
    pub name: String,
    pub count: i64,
    pub amount: Decimal,
}

impl DenominationDelta {
    pub fn new(name: impl Into<String>, count: i64, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            count,
            amount,
        }
    }
}

/// Movement of one tender within a transaction.
///
/// `amount` and the denomination amounts are applied independently; nothing
/// requires them to agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderMovement {
    pub id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub denominations: Vec<DenominationDelta>,
}

impl TenderMovement {
    pub fn new(id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            amount,
            denominations: Vec::new(),
        }
    }

    pub fn with_denomination(mut self, name: impl Into<String>, count: i64, amount: Decimal) -> Self {
        self.denominations.push(DenominationDelta::new(name, count, amount));
        self
    }
}

/// Request to move tenders between two tills of one ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(flatten)]
    pub address: LedgerAddress,
    pub source: String,
    pub destination: String,
    /// Raw direction as received; resolved when the transaction is processed
    pub direction: String,
    #[serde(default)]
    pub tenders: Vec<TenderMovement>,
}

impl Transaction {
    pub fn new(
        address: LedgerAddress,
        source: impl Into<String>,
        destination: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        Self {
            address,
            source: source.into(),
            destination: destination.into(),
            direction: direction.into(),
            tenders: Vec::new(),
        }
    }

    pub fn with_tender(mut self, tender: TenderMovement) -> Self {
        self.tenders.push(tender);
        self
    }

    /// Resolve the raw direction text.
    pub fn direction(&self) -> Result<Direction, DomainError> {
        self.direction.parse()
    }

    /// Validate the whole request, direction first.
    ///
    /// # Errors
    /// - `DomainError::InvalidDirection` for unrecognized direction text
    /// - `DomainError::InvalidIdentifier` for empty IDs or IDs containing ':'
    /// - `DomainError::InvalidAmount` for amounts with more than 8 decimals
    ///   or beyond the per-movement limit
    pub fn validate(&self) -> Result<Direction, DomainError> {
        let direction = self.direction()?;

        self.address.validate()?;
        validate_identifier("source", &self.source)?;
        validate_identifier("destination", &self.destination)?;

        for tender in &self.tenders {
            validate_identifier("tender", &tender.id)?;
            validate_scale(&tender.id, tender.amount)?;
            validate_magnitude(&tender.id, tender.amount)?;
            for denomination in &tender.denominations {
                validate_identifier("denomination", &denomination.name)?;
                let field = format!("{}/{}", tender.id, denomination.name);
                validate_scale(&field, denomination.amount)?;
                validate_magnitude(&field, denomination.amount)?;
                // count is negated for the source till
                if denomination.count == i64::MIN {
                    return Err(DomainError::invalid_amount(field, "count out of range"));
                }
            }
        }

        Ok(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn address() -> LedgerAddress {
        LedgerAddress::new("test-org", "test-eu", "settlement-id-1")
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(">".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!("<".parse::<Direction>().unwrap(), Direction::Reverse);
        assert_eq!("Forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!("REVERSE".parse::<Direction>().unwrap(), Direction::Reverse);
        assert_eq!(
            "x".parse::<Direction>(),
            Err(DomainError::InvalidDirection("x".to_string()))
        );
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Reverse.sign(), -1);
        assert_eq!(Direction::Reverse.signed(dec!(1.5)), dec!(-1.5));
    }

    #[test]
    fn test_validate_checks_direction_first() {
        let tx = Transaction::new(address(), "", "till-2", "x");
        assert_eq!(
            tx.validate(),
            Err(DomainError::InvalidDirection("x".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_bad_denomination_name() {
        let tx = Transaction::new(address(), "till-1", "till-2", ">").with_tender(
            TenderMovement::new("cash", dec!(1)).with_denomination("a:b", 1, dec!(1)),
        );
        assert!(matches!(
            tx.validate(),
            Err(DomainError::InvalidIdentifier { field: "denomination", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_amounts() {
        let tender = Transaction::new(address(), "till-1", "till-2", ">")
            .with_tender(TenderMovement::new("cash", dec!(50000000000000000000000000000)));
        assert!(matches!(
            tender.validate(),
            Err(DomainError::InvalidAmount { ref field, .. }) if field == "cash"
        ));

        let denomination = Transaction::new(address(), "till-1", "till-2", ">").with_tender(
            TenderMovement::new("cash", dec!(0))
                .with_denomination("a", 1, dec!(50000000000000000000000000000))
                .with_denomination("b", 1, dec!(50000000000000000000000000000)),
        );
        assert!(matches!(
            denomination.validate(),
            Err(DomainError::InvalidAmount { ref field, .. }) if field == "cash/a"
        ));
    }

    #[test]
    fn test_validate_ok() {
        let tx = Transaction::new(address(), "till-1", "till-2", "<").with_tender(
            TenderMovement::new("cash", dec!(1.5))
                .with_denomination("dollar bill", 1, dec!(1))
                .with_denomination("quarter", 2, dec!(0.5)),
        );
        assert_eq!(tx.validate(), Ok(Direction::Reverse));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "organization": "test-org",
            "enterprise_unit": "test-eu",
            "settlement_doc_id": "s1",
            "source": "till-1",
            "destination": "till-2",
            "direction": ">",
            "tenders": [{"id": "cash", "amount": "1.5"}]
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.address, LedgerAddress::new("test-org", "test-eu", "s1"));
        assert_eq!(tx.tenders[0].amount, dec!(1.5));
        assert!(tx.tenders[0].denominations.is_empty());
    }
}
