//! Ledger engine
//!
//! Applies transfers between tills and assembles ledger snapshots. Holds no
//! ledger state of its own: every read goes back to the store.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::amount::parse_stored_amount;
use crate::domain::{
    DenominationBreakdown, Direction, LedgerAddress, OperationContext, Tender, Till, Transaction,
};
use crate::keys::{KeySchema, AMOUNT_FIELD, COUNT_FIELD};
use crate::store::{LedgerStore, WriteOp};

use super::journal::{self, JournalEntry, ReconciliationReport};
use super::LedgerError;

/// How the write plan of one transaction reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// One all-or-nothing batch; readers never see half a transfer
    #[default]
    Atomic,
    /// One command per write, first failure aborts, no rollback
    Sequential,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "atomic" => Ok(WriteMode::Atomic),
            "sequential" => Ok(WriteMode::Sequential),
            other => Err(format!("unknown write mode {other:?}")),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Atomic => f.write_str("atomic"),
            WriteMode::Sequential => f.write_str("sequential"),
        }
    }
}

/// Engine behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub write_mode: WriteMode,
    /// Append every applied transaction to the per-ledger journal
    pub journal: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Atomic,
            journal: true,
        }
    }
}

impl EngineOptions {
    /// Unguarded sequential writes and no journal. Produces the same keys and
    /// write order as the legacy sequential writer that shares these keys.
    pub fn compatibility() -> Self {
        Self {
            write_mode: WriteMode::Sequential,
            journal: false,
        }
    }
}

/// Result of a successfully applied transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub direction: Direction,
    /// Balance and set writes issued (journal excluded)
    pub writes: usize,
    /// Journal sequence number, when journaling is on
    pub sequence: Option<u64>,
}

/// Build the ordered write plan for one transaction.
///
/// Order per tender: denomination records (destination amount, destination
/// count, source amount, source count), then both denomination sets, then
/// both tender balances. After all tenders: both tenders sets, then the tills
/// set, which is written even when the tender list is empty.
pub fn plan_writes(keys: &KeySchema, transaction: &Transaction, direction: Direction) -> Vec<WriteOp> {
    let source = transaction.source.as_str();
    let destination = transaction.destination.as_str();
    let sign = direction.sign();

    let mut ops = Vec::new();
    let mut tender_ids = Vec::with_capacity(transaction.tenders.len());

    for tender in &transaction.tenders {
        let mut names = Vec::with_capacity(tender.denominations.len());

        for denomination in &tender.denominations {
            let dest_key = keys.denomination_record(destination, &tender.id, &denomination.name);
            let source_key = keys.denomination_record(source, &tender.id, &denomination.name);

            ops.push(WriteOp::IncrementRecordDecimal {
                key: dest_key.clone(),
                field: AMOUNT_FIELD,
                delta: direction.signed(denomination.amount),
            });
            ops.push(WriteOp::IncrementRecordInteger {
                key: dest_key,
                field: COUNT_FIELD,
                delta: sign * denomination.count,
            });
            ops.push(WriteOp::IncrementRecordDecimal {
                key: source_key.clone(),
                field: AMOUNT_FIELD,
                delta: direction.signed(-denomination.amount),
            });
            ops.push(WriteOp::IncrementRecordInteger {
                key: source_key,
                field: COUNT_FIELD,
                delta: sign * -denomination.count,
            });

            names.push(denomination.name.clone());
        }

        if !names.is_empty() {
            ops.push(WriteOp::AddToSet {
                key: keys.denominations_set(source, &tender.id),
                members: names.clone(),
            });
            ops.push(WriteOp::AddToSet {
                key: keys.denominations_set(destination, &tender.id),
                members: names,
            });
        }

        ops.push(WriteOp::IncrementScalarDecimal {
            key: keys.tender_balance(destination, &tender.id),
            delta: direction.signed(tender.amount),
        });
        ops.push(WriteOp::IncrementScalarDecimal {
            key: keys.tender_balance(source, &tender.id),
            delta: direction.signed(-tender.amount),
        });

        tender_ids.push(tender.id.clone());
    }

    if !tender_ids.is_empty() {
        ops.push(WriteOp::AddToSet {
            key: keys.tenders_set(source),
            members: tender_ids.clone(),
        });
        ops.push(WriteOp::AddToSet {
            key: keys.tenders_set(destination),
            members: tender_ids,
        });
    }

    ops.push(WriteOp::AddToSet {
        key: keys.tills_set(),
        members: vec![source.to_string(), destination.to_string()],
    });

    ops
}

/// Settlement ledger over a key-value store
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    options: EngineOptions,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn LedgerStore>, options: EngineOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Apply a transfer between two tills.
    ///
    /// # Errors
    /// - `LedgerError::InvalidDirection` / `LedgerError::InvalidRequest`
    ///   before anything is written
    /// - `LedgerError::Store` from the first failing store call. In
    ///   sequential mode the writes issued before it stay applied.
    #[instrument(
        skip(self, transaction, context),
        fields(
            address = %transaction.address,
            source = %transaction.source,
            destination = %transaction.destination,
            mode = %self.options.write_mode
        ),
        err
    )]
    pub async fn process_transaction(
        &self,
        transaction: &Transaction,
        context: &OperationContext,
    ) -> Result<ProcessOutcome, LedgerError> {
        let direction = transaction.validate()?;
        let keys = KeySchema::new(&transaction.address);
        let mut ops = plan_writes(&keys, transaction, direction);
        let writes = ops.len();

        debug!(writes, tenders = transaction.tenders.len(), "write plan built");

        let sequence = match self.options.write_mode {
            WriteMode::Atomic => {
                let sequence = if self.options.journal {
                    let entry = self.next_journal_entry(&keys, transaction, direction, context).await?;
                    ops.push(WriteOp::AppendToList {
                        key: keys.journal(),
                        value: serde_json::to_string(&entry)?,
                    });
                    Some(entry.sequence)
                } else {
                    None
                };
                self.store.apply_atomic(&ops).await?;
                sequence
            }
            WriteMode::Sequential => {
                for op in &ops {
                    self.store.apply(op).await?;
                }
                if self.options.journal {
                    let entry = self.next_journal_entry(&keys, transaction, direction, context).await?;
                    self.store
                        .append_to_list(&keys.journal(), &serde_json::to_string(&entry)?)
                        .await?;
                    Some(entry.sequence)
                } else {
                    None
                }
            }
        };

        info!(%direction, writes, ?sequence, "transaction applied");

        Ok(ProcessOutcome {
            direction,
            writes,
            sequence,
        })
    }

    async fn next_journal_entry(
        &self,
        keys: &KeySchema,
        transaction: &Transaction,
        direction: Direction,
        context: &OperationContext,
    ) -> Result<JournalEntry, LedgerError> {
        let sequence = self.store.next_sequence(&keys.journal_sequence()).await?;
        Ok(JournalEntry::new(sequence, transaction.clone(), direction, context))
    }

    /// Read every till of a ledger with its tenders and denominations.
    ///
    /// Tills, tenders and denominations come back sorted by ID. A single
    /// unparseable numeric field fails the whole read.
    #[instrument(skip(self), fields(address = %address), err)]
    pub async fn get_ledger_state(&self, address: &LedgerAddress) -> Result<Vec<Till>, LedgerError> {
        address.validate()?;
        let keys = KeySchema::new(address);

        let mut till_ids = self.store.read_set_members(&keys.tills_set()).await?;
        till_ids.sort();

        let mut tills = Vec::with_capacity(till_ids.len());
        for till_id in till_ids {
            let mut tender_ids = self.store.read_set_members(&keys.tenders_set(&till_id)).await?;
            tender_ids.sort();

            let mut tenders = Vec::with_capacity(tender_ids.len());
            for tender_id in tender_ids {
                let tender = self.read_tender(&keys, &till_id, tender_id).await?;
                if let Some(divergence) = tender.denomination_divergence() {
                    warn!(
                        till = %till_id,
                        tender = %tender.id,
                        amount = %tender.amount,
                        denomination_total = ?tender.denomination_total(),
                        %divergence,
                        "tender balance differs from its denomination breakdown"
                    );
                }
                tenders.push(tender);
            }

            tills.push(Till { id: till_id, tenders });
        }

        debug!(tills = tills.len(), "ledger state read");
        Ok(tills)
    }

    async fn read_tender(
        &self,
        keys: &KeySchema,
        till_id: &str,
        tender_id: String,
    ) -> Result<Tender, LedgerError> {
        let balance_key = keys.tender_balance(till_id, &tender_id);
        let raw_balance = self.store.read_scalar(&balance_key).await?;
        let amount = parse_stored_amount(&raw_balance)
            .map_err(|_| LedgerError::parse(&balance_key, "balance", raw_balance.as_str()))?;

        let mut names = self
            .store
            .read_set_members(&keys.denominations_set(till_id, &tender_id))
            .await?;
        names.sort();

        let mut denominations = Vec::with_capacity(names.len());
        for name in names {
            let record_key = keys.denomination_record(till_id, &tender_id, &name);
            let record = self.store.read_record(&record_key).await?;

            let raw_count = record.get(COUNT_FIELD).map(String::as_str).unwrap_or_default();
            let count = raw_count
                .trim()
                .parse::<i64>()
                .map_err(|_| LedgerError::parse(&record_key, COUNT_FIELD, raw_count))?;

            let raw_amount = record.get(AMOUNT_FIELD).map(String::as_str).unwrap_or_default();
            let amount: Decimal = parse_stored_amount(raw_amount)
                .map_err(|_| LedgerError::parse(&record_key, AMOUNT_FIELD, raw_amount))?;

            denominations.push(DenominationBreakdown {
                name,
                count,
                amount,
            });
        }

        Ok(Tender {
            id: tender_id,
            amount,
            denominations,
        })
    }

    /// Journal entries of a ledger in sequence order.
    pub async fn journal(&self, address: &LedgerAddress) -> Result<Vec<JournalEntry>, LedgerError> {
        address.validate()?;
        let keys = KeySchema::new(address);
        let mut entries = self
            .store
            .read_list(&keys.journal())
            .await?
            .iter()
            .map(|raw| serde_json::from_str::<JournalEntry>(raw))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.sequence);
        Ok(entries)
    }

    /// Replay the journal and compare it against the stored balances.
    #[instrument(skip(self), fields(address = %address), err)]
    pub async fn reconcile(&self, address: &LedgerAddress) -> Result<ReconciliationReport, LedgerError> {
        let entries = self.journal(address).await?;
        let expected = journal::replay(&entries)?;
        let actual = self.get_ledger_state(address).await?;

        let report = ReconciliationReport::compare(address.clone(), entries.len(), &expected, &actual);
        if !report.consistent {
            warn!(mismatches = report.mismatches.len(), "ledger does not match its journal");
        }
        Ok(report)
    }
}
