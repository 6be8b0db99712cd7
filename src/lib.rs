//! till-ledger Library
//!
//! Cash-settlement ledger: tracks the tenders and denominations held by each
//! till of a settlement period and moves them between tills.

pub mod api;
pub mod config;
pub mod domain;
pub mod keys;
pub mod ledger;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{LedgerAddress, OperationContext, Tender, Till, Transaction};
pub use error::{AppError, AppResult};
pub use keys::KeySchema;
pub use ledger::{EngineOptions, LedgerEngine, LedgerError, WriteMode};
pub use store::{LedgerStore, MemoryStore, RedisStore, StoreError};
