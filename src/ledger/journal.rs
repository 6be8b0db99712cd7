//! Transfer journal
//!
//! Append-only log of applied transactions per ledger, keyed by a monotonic
//! sequence number. Replaying it rebuilds the balances the ledger should
//! hold, which is what reconciliation compares against.
//!
//! A journal only reconciles cleanly if it was enabled before the first
//! transfer of the settlement period.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::domain::{
    DenominationBreakdown, Direction, LedgerAddress, OperationContext, Tender, Till, Transaction,
};

use super::LedgerError;

/// One applied transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    /// Direction as resolved when the transaction was applied
    pub direction: Direction,
    pub transaction: Transaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    pub applied_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(
        sequence: u64,
        transaction: Transaction,
        direction: Direction,
        context: &OperationContext,
    ) -> Self {
        Self {
            sequence,
            direction,
            transaction,
            correlation_id: context.correlation_id,
            applied_at: Utc::now(),
        }
    }
}

#[derive(Default)]
struct ReplayTender {
    amount: Decimal,
    denominations: BTreeMap<String, (i64, Decimal)>,
}

/// Fold journal entries into the balances they imply.
///
/// Uses the same sign rules as the write path, so for a ledger written only
/// through the journaling engine the result equals the stored state.
///
/// # Errors
/// `LedgerError::Overflow` if a running total leaves the representable range.
pub fn replay(entries: &[JournalEntry]) -> Result<Vec<Till>, LedgerError> {
    let mut tills: BTreeMap<String, BTreeMap<String, ReplayTender>> = BTreeMap::new();

    for entry in entries {
        let tx = &entry.transaction;
        let sign = entry.direction.sign();

        tills.entry(tx.source.clone()).or_default();
        tills.entry(tx.destination.clone()).or_default();

        for movement in &tx.tenders {
            for (till, flip) in [(&tx.destination, 1i64), (&tx.source, -1i64)] {
                let overflow = || LedgerError::overflow(entry.sequence, till, &movement.id);
                let tender = tills
                    .entry(till.clone())
                    .or_default()
                    .entry(movement.id.clone())
                    .or_default();

                let factor = Decimal::from(sign * flip);
                tender.amount = tender
                    .amount
                    .checked_add(factor * movement.amount)
                    .ok_or_else(overflow)?;

                for denomination in &movement.denominations {
                    let slot = tender
                        .denominations
                        .entry(denomination.name.clone())
                        .or_insert((0, Decimal::ZERO));
                    let count = (sign * flip)
                        .checked_mul(denomination.count)
                        .and_then(|delta| slot.0.checked_add(delta))
                        .ok_or_else(overflow)?;
                    let amount = slot
                        .1
                        .checked_add(factor * denomination.amount)
                        .ok_or_else(overflow)?;
                    *slot = (count, amount);
                }
            }
        }
    }

    Ok(tills
        .into_iter()
        .map(|(id, tenders)| Till {
            id,
            tenders: tenders
                .into_iter()
                .map(|(id, tender)| Tender {
                    id,
                    amount: tender.amount,
                    denominations: tender
                        .denominations
                        .into_iter()
                        .map(|(name, (count, amount))| DenominationBreakdown {
                            name,
                            count,
                            amount,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect())
}

/// One balance where the journal and the store disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub till: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denomination: Option<String>,
    pub field: &'static str,
    /// Value implied by the journal; `None` if the journal never touched it
    pub expected: Option<String>,
    /// Value in the store; `None` if the store does not have it
    pub actual: Option<String>,
}

/// Outcome of comparing replayed balances with stored balances
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub address: LedgerAddress,
    pub entries_replayed: usize,
    pub consistent: bool,
    pub mismatches: Vec<Mismatch>,
}

type BalanceKey = (String, Option<String>, Option<String>, &'static str);

fn flatten(tills: &[Till]) -> BTreeMap<BalanceKey, String> {
    let mut out = BTreeMap::new();
    for till in tills {
        out.insert((till.id.clone(), None, None, "registered"), "true".to_string());
        for tender in &till.tenders {
            out.insert(
                (till.id.clone(), Some(tender.id.clone()), None, "amount"),
                tender.amount.normalize().to_string(),
            );
            for denomination in &tender.denominations {
                let name = Some(denomination.name.clone());
                out.insert(
                    (till.id.clone(), Some(tender.id.clone()), name.clone(), "count"),
                    denomination.count.to_string(),
                );
                out.insert(
                    (till.id.clone(), Some(tender.id.clone()), name, "amount"),
                    denomination.amount.normalize().to_string(),
                );
            }
        }
    }
    out
}

impl ReconciliationReport {
    pub fn compare(
        address: LedgerAddress,
        entries_replayed: usize,
        expected: &[Till],
        actual: &[Till],
    ) -> Self {
        let expected = flatten(expected);
        let actual = flatten(actual);

        let keys: BTreeSet<&BalanceKey> = expected.keys().chain(actual.keys()).collect();
        let mismatches: Vec<Mismatch> = keys
            .into_iter()
            .filter_map(|key| {
                let want = expected.get(key);
                let have = actual.get(key);
                (want != have).then(|| Mismatch {
                    till: key.0.clone(),
                    tender: key.1.clone(),
                    denomination: key.2.clone(),
                    field: key.3,
                    expected: want.cloned(),
                    actual: have.cloned(),
                })
            })
            .collect();

        Self {
            address,
            entries_replayed,
            consistent: mismatches.is_empty(),
            mismatches,
        }
    }
}
