//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal_macros::dec;
use till_ledger::domain::TenderMovement;
use till_ledger::{EngineOptions, LedgerAddress, LedgerEngine, MemoryStore, Transaction};

pub fn address() -> LedgerAddress {
    LedgerAddress::new("test-org", "test-eu", "settlement-id-1")
}

/// Engine over a fresh in-memory store; the store handle is returned too so
/// tests can inspect or corrupt it.
pub fn setup_engine(options: EngineOptions) -> (Arc<MemoryStore>, LedgerEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = LedgerEngine::new(store.clone(), options);
    (store, engine)
}

/// The cash transfer used throughout: 1.5 in cash, one dollar bill and two
/// quarters.
pub fn cash_transfer(source: &str, destination: &str, direction: &str) -> Transaction {
    Transaction::new(address(), source, destination, direction).with_tender(
        TenderMovement::new("cash", dec!(1.5))
            .with_denomination("dollar bill", 1, dec!(1))
            .with_denomination("quarter", 2, dec!(0.5)),
    )
}
