//! Ledger module
//!
//! Transfer and aggregation algorithms over a [`LedgerStore`](crate::store::LedgerStore),
//! plus the optional transfer journal.

mod engine;
mod error;
pub mod journal;

pub use engine::{plan_writes, EngineOptions, LedgerEngine, ProcessOutcome, WriteMode};
pub use error::LedgerError;
pub use journal::{JournalEntry, Mismatch, ReconciliationReport};
