//! Load Testing Tool
//!
//! Fires concurrent transfers at a live Redis ledger and checks that value is
//! conserved across all tills afterwards.
//!
//! Run with: cargo run --bin load_test --release -- --transactions 1000 --tills 8

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use till_ledger::domain::TenderMovement;
use till_ledger::{
    EngineOptions, LedgerAddress, LedgerEngine, OperationContext, RedisStore, Transaction, WriteMode,
};

fn arg<T: std::str::FromStr>(args: &[String], name: &str) -> Option<T> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let transaction_count: u64 = arg(&args, "--transactions").unwrap_or(1000);
    let till_count: u64 = arg(&args, "--tills").unwrap_or(8).max(2);
    let workers: u64 = arg(&args, "--workers").unwrap_or(16).max(1);
    let write_mode: WriteMode = arg(&args, "--mode").unwrap_or_default();

    let redis_url = std::env::var("REDIS_URL")?;

    println!(
        "Load Test - {} transactions across {} tills ({} workers, {} writes)",
        transaction_count, till_count, workers, write_mode
    );
    println!("Connecting to Redis...");

    let store = RedisStore::connect(&redis_url, Duration::from_secs(5)).await?;
    let engine = Arc::new(LedgerEngine::new(
        Arc::new(store),
        EngineOptions {
            write_mode,
            journal: false,
        },
    ));

    // Fresh settlement per run so earlier runs do not skew the totals
    let address = LedgerAddress::new(
        "load-test",
        "eu-1",
        format!("run-{}", uuid::Uuid::new_v4().simple()),
    );

    let start = Instant::now();
    let mut handles = Vec::new();

    for worker in 0..workers {
        let engine = engine.clone();
        let address = address.clone();
        handles.push(tokio::spawn(async move {
            let mut ok = 0u64;
            let mut failed = 0u64;
            let context = OperationContext::new();
            for i in (worker..transaction_count).step_by(workers as usize) {
                let source = format!("till-{}", i % till_count);
                let destination = format!("till-{}", (i * 7 + 1) % till_count);
                let direction = if i % 3 == 0 { "<" } else { ">" };
                let cents = Decimal::new((i % 500 + 1) as i64, 2);

                let tx = Transaction::new(address.clone(), source, destination, direction)
                    .with_tender(
                        TenderMovement::new("cash", cents)
                            .with_denomination("penny", (i % 500 + 1) as i64, cents),
                    );

                match engine.process_transaction(&tx, &context).await {
                    Ok(_) => ok += 1,
                    Err(e) => {
                        failed += 1;
                        if failed <= 5 {
                            eprintln!("Error processing transaction {}: {}", i, e);
                        }
                    }
                }
            }
            (ok, failed)
        }));
    }

    let mut success_count = 0u64;
    let mut error_count = 0u64;
    for handle in handles {
        let (ok, failed) = handle.await?;
        success_count += ok;
        error_count += failed;
    }

    let duration = start.elapsed();
    let tps = success_count as f64 / duration.as_secs_f64();

    println!("\n=== Results ===");
    println!("Total transactions: {}", transaction_count);
    println!("Successful: {}", success_count);
    println!("Errors: {}", error_count);
    println!("Duration: {:.2}s", duration.as_secs_f64());
    println!("Throughput: {:.2} transactions/sec", tps);

    let tills = engine.get_ledger_state(&address).await?;
    let total = tills
        .iter()
        .flat_map(|till| till.tenders.iter())
        .try_fold(Decimal::ZERO, |sum, tender| sum.checked_add(tender.amount))
        .ok_or_else(|| anyhow::anyhow!("cash balances overflow"))?;
    let pennies = tills
        .iter()
        .flat_map(|till| till.tenders.iter())
        .flat_map(|tender| tender.denominations.iter())
        .try_fold(0i64, |sum, d| sum.checked_add(d.count))
        .ok_or_else(|| anyhow::anyhow!("penny counts overflow"))?;

    println!("\n=== Conservation ===");
    println!("Tills: {}", tills.len());
    println!("Sum of cash balances: {}", total);
    println!("Sum of penny counts: {}", pennies);

    if !total.is_zero() || pennies != 0 {
        anyhow::bail!("ledger is not balanced");
    }
    println!("Ledger balanced");

    Ok(())
}
