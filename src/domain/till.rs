//! Ledger snapshot types
//!
//! Read-side view of a ledger: tills holding tenders, tenders broken down
//! into denominations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Running totals for one denomination of a tender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenominationBreakdown {
    pub name: String,
    pub count: i64,
    pub amount: Decimal,
}

/// Mismatch between a tender balance and the sum of its denominations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// Tender balance minus the denomination total
    Difference(Decimal),
    /// Totals too large to compare
    Unknown,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Difference(diff) => write!(f, "{diff}"),
            Divergence::Unknown => f.write_str("unknown (overflow)"),
        }
    }
}

/// Balance of one tender held by a till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    pub id: String,
    pub amount: Decimal,
    pub denominations: Vec<DenominationBreakdown>,
}

impl Tender {
    pub fn denomination(&self, name: &str) -> Option<&DenominationBreakdown> {
        self.denominations.iter().find(|d| d.name == name)
    }

    /// Sum of the denomination amounts, `None` if it overflows.
    pub fn denomination_total(&self) -> Option<Decimal> {
        self.denominations
            .iter()
            .try_fold(Decimal::ZERO, |total, d| total.checked_add(d.amount))
    }

    /// Difference between the tender balance and its breakdown.
    ///
    /// `None` when there is no breakdown or the two agree. A divergence is a
    /// monitoring signal only; the two totals are tracked independently.
    pub fn denomination_divergence(&self) -> Option<Divergence> {
        if self.denominations.is_empty() {
            return None;
        }
        let diff = self
            .denomination_total()
            .and_then(|total| self.amount.checked_sub(total));
        match diff {
            Some(diff) if diff.is_zero() => None,
            Some(diff) => Some(Divergence::Difference(diff)),
            None => Some(Divergence::Unknown),
        }
    }
}

/// A balance holder and the tenders it has ever touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Till {
    pub id: String,
    pub tenders: Vec<Tender>,
}

impl Till {
    pub fn tender(&self, id: &str) -> Option<&Tender> {
        self.tenders.iter().find(|t| t.id == id)
    }
}

/// Find a till by ID in a snapshot.
pub fn find_till<'a>(tills: &'a [Till], id: &str) -> Option<&'a Till> {
    tills.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cash(amount: Decimal, denominations: Vec<(&str, i64, Decimal)>) -> Tender {
        Tender {
            id: "cash".to_string(),
            amount,
            denominations: denominations
                .into_iter()
                .map(|(name, count, amount)| DenominationBreakdown {
                    name: name.to_string(),
                    count,
                    amount,
                })
                .collect(),
        }
    }

    #[test]
    fn test_no_divergence_when_totals_agree() {
        let tender = cash(dec!(1.5), vec![("dollar bill", 1, dec!(1)), ("quarter", 2, dec!(0.5))]);
        assert_eq!(tender.denomination_total(), Some(dec!(1.5)));
        assert_eq!(tender.denomination_divergence(), None);
    }

    #[test]
    fn test_divergence_reported() {
        let tender = cash(dec!(2), vec![("quarter", 2, dec!(0.5))]);
        assert_eq!(
            tender.denomination_divergence(),
            Some(Divergence::Difference(dec!(1.5)))
        );
    }

    #[test]
    fn test_overflowing_breakdown_is_unknown_divergence() {
        let tender = cash(
            dec!(0),
            vec![
                ("a", 1, dec!(50000000000000000000000000000)),
                ("b", 1, dec!(50000000000000000000000000000)),
            ],
        );
        assert_eq!(tender.denomination_total(), None);
        assert_eq!(tender.denomination_divergence(), Some(Divergence::Unknown));
    }

    #[test]
    fn test_balance_minus_total_overflow_is_unknown() {
        let tender = cash(
            dec!(-50000000000000000000000000000),
            vec![("a", 1, dec!(50000000000000000000000000000))],
        );
        assert_eq!(tender.denomination_divergence(), Some(Divergence::Unknown));
    }

    #[test]
    fn test_no_breakdown_is_not_divergence() {
        let tender = cash(dec!(10), vec![]);
        assert_eq!(tender.denomination_divergence(), None);
    }

    #[test]
    fn test_lookup_helpers() {
        let till = Till {
            id: "till-1".to_string(),
            tenders: vec![cash(dec!(1), vec![("quarter", 4, dec!(1))])],
        };
        let tills = vec![till];
        let found = find_till(&tills, "till-1").unwrap();
        assert_eq!(found.tender("cash").unwrap().denomination("quarter").unwrap().count, 4);
        assert!(find_till(&tills, "till-9").is_none());
    }
}
