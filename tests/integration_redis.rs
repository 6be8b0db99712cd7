//! Redis store tests
//!
//! Need a running server: `REDIS_URL=redis://localhost:6379 cargo test -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use till_ledger::domain::till::find_till;
use till_ledger::{
    EngineOptions, KeySchema, LedgerAddress, LedgerEngine, LedgerError, LedgerStore,
    OperationContext, RedisStore, Transaction, WriteMode,
};

mod common;

async fn connect() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let store = RedisStore::connect(&url, Duration::from_secs(2))
        .await
        .expect("Failed to connect to Redis");
    store.ping().await.expect("Redis did not answer PING");
    store
}

/// Settlement unique to one test run
fn fresh_address() -> LedgerAddress {
    LedgerAddress::new(
        "test-org",
        "test-eu",
        format!("settlement-{}", uuid::Uuid::new_v4().simple()),
    )
}

fn transfer(address: &LedgerAddress, source: &str, destination: &str, direction: &str) -> Transaction {
    let mut tx = common::cash_transfer(source, destination, direction);
    tx.address = address.clone();
    tx
}

#[tokio::test]
#[ignore]
async fn test_redis_round_trip_atomic() {
    let engine = LedgerEngine::new(Arc::new(connect().await), EngineOptions::default());
    let address = fresh_address();
    let ctx = OperationContext::new();

    engine
        .process_transaction(&transfer(&address, "till-1", "till-2", ">"), &ctx)
        .await
        .unwrap();

    let tills = engine.get_ledger_state(&address).await.unwrap();
    assert_eq!(tills.len(), 2);
    let cash = find_till(&tills, "till-2").unwrap().tender("cash").unwrap();
    assert_eq!(cash.amount, dec!(1.5));
    assert_eq!(cash.denomination("quarter").unwrap().count, 2);
    assert_eq!(cash.denomination("quarter").unwrap().amount, dec!(0.5));

    let report = engine.reconcile(&address).await.unwrap();
    assert!(report.consistent, "{:?}", report.mismatches);
}

#[tokio::test]
#[ignore]
async fn test_redis_sequential_matches_atomic() {
    let store = Arc::new(connect().await);
    let atomic = LedgerEngine::new(store.clone(), EngineOptions::default());
    let sequential = LedgerEngine::new(
        store,
        EngineOptions {
            write_mode: WriteMode::Sequential,
            journal: true,
        },
    );
    let ctx = OperationContext::new();

    let a = fresh_address();
    let b = fresh_address();
    for (engine, address) in [(&atomic, &a), (&sequential, &b)] {
        engine.process_transaction(&transfer(address, "till-1", "till-2", ">"), &ctx).await.unwrap();
        engine.process_transaction(&transfer(address, "till-2", "till-3", "<"), &ctx).await.unwrap();
    }

    assert_eq!(
        atomic.get_ledger_state(&a).await.unwrap(),
        sequential.get_ledger_state(&b).await.unwrap()
    );
}

#[tokio::test]
#[ignore]
async fn test_redis_corrupt_count_is_parse_error() {
    let store = Arc::new(connect().await);
    let engine = LedgerEngine::new(store.clone(), EngineOptions::compatibility());
    let address = fresh_address();
    let keys = KeySchema::new(&address);

    // Registered denomination whose count is not an integer
    store.add_to_set(&keys.tills_set(), &["till-1".to_string()]).await.unwrap();
    store.add_to_set(&keys.tenders_set("till-1"), &["cash".to_string()]).await.unwrap();
    store
        .increment_scalar_decimal(&keys.tender_balance("till-1", "cash"), dec!(1))
        .await
        .unwrap();
    store
        .add_to_set(&keys.denominations_set("till-1", "cash"), &["quarter".to_string()])
        .await
        .unwrap();
    store
        .increment_record_field_decimal(&keys.denomination_record("till-1", "cash", "quarter"), "count", dec!(0.5))
        .await
        .unwrap();

    assert!(matches!(
        engine.get_ledger_state(&address).await,
        Err(LedgerError::Parse { field: "count", .. })
    ));
}
