//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{LedgerAddress, OperationContext, Till, Transaction};
use crate::error::AppError;
use crate::ledger::{JournalEntry, LedgerEngine, ReconciliationReport};

/// Shared router state
pub type AppState = Arc<LedgerEngine>;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub status: String,
    pub direction: String,
    pub writes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    pub correlation_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerStateResponse {
    pub address: LedgerAddress,
    pub tills: Vec<Till>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JournalResponse {
    pub entries: Vec<JournalEntry>,
    pub total: usize,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(process_transaction))
        .route("/ledgers/:org/:eu/:settlement", get(get_ledger_state))
        .route("/ledgers/:org/:eu/:settlement/journal", get(get_journal))
        .route(
            "/ledgers/:org/:eu/:settlement/reconciliation",
            get(get_reconciliation),
        )
}

// =========================================================================
// POST /transactions
// =========================================================================

/// Apply a transfer between two tills
async fn process_transaction(
    State(engine): State<AppState>,
    context: Option<Extension<OperationContext>>,
    Json(transaction): Json<Transaction>,
) -> Result<Json<TransactionResponse>, AppError> {
    let mut context = context.map(|Extension(c)| c).unwrap_or_default();
    let correlation_id = context.ensure_correlation_id();

    let outcome = engine.process_transaction(&transaction, &context).await?;

    Ok(Json(TransactionResponse {
        status: "applied".to_string(),
        direction: outcome.direction.to_string(),
        writes: outcome.writes,
        sequence: outcome.sequence,
        correlation_id,
    }))
}

// =========================================================================
// GET /ledgers/:org/:eu/:settlement
// =========================================================================

/// Snapshot of every till in a ledger
async fn get_ledger_state(
    State(engine): State<AppState>,
    Path((org, eu, settlement)): Path<(String, String, String)>,
) -> Result<Json<LedgerStateResponse>, AppError> {
    let address = LedgerAddress::new(org, eu, settlement);
    let tills = engine.get_ledger_state(&address).await?;

    Ok(Json(LedgerStateResponse { address, tills }))
}

// =========================================================================
// GET /ledgers/:org/:eu/:settlement/journal
// =========================================================================

async fn get_journal(
    State(engine): State<AppState>,
    Path((org, eu, settlement)): Path<(String, String, String)>,
) -> Result<Json<JournalResponse>, AppError> {
    let address = LedgerAddress::new(org, eu, settlement);
    let entries = engine.journal(&address).await?;

    Ok(Json(JournalResponse {
        total: entries.len(),
        entries,
    }))
}

// =========================================================================
// GET /ledgers/:org/:eu/:settlement/reconciliation
// =========================================================================

async fn get_reconciliation(
    State(engine): State<AppState>,
    Path((org, eu, settlement)): Path<(String, String, String)>,
) -> Result<Json<ReconciliationReport>, AppError> {
    let address = LedgerAddress::new(org, eu, settlement);
    Ok(Json(engine.reconcile(&address).await?))
}
