//! Domain module
//!
//! Value objects for the settlement ledger: addresses, tills, tenders,
//! denominations and the transfer requests that move them.

pub mod address;
pub mod amount;
pub mod context;
pub mod error;
pub mod till;
pub mod transaction;

pub use address::LedgerAddress;
pub use context::OperationContext;
pub use error::DomainError;
pub use till::{DenominationBreakdown, Divergence, Tender, Till};
pub use transaction::{DenominationDelta, Direction, TenderMovement, Transaction};
