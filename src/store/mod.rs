//! Store module
//!
//! Adapter over the key-value engine that holds the ledger. Each primitive is
//! atomic on its own; grouping writes is only possible through
//! [`LedgerStore::apply_atomic`].

mod error;
mod memory;
mod redis_store;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub use self::error::StoreError;
pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// One planned mutation of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    IncrementRecordDecimal {
        key: String,
        field: &'static str,
        delta: Decimal,
    },
    IncrementRecordInteger {
        key: String,
        field: &'static str,
        delta: i64,
    },
    IncrementScalarDecimal {
        key: String,
        delta: Decimal,
    },
    AddToSet {
        key: String,
        members: Vec<String>,
    },
    AppendToList {
        key: String,
        value: String,
    },
}

impl WriteOp {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::IncrementRecordDecimal { key, .. }
            | WriteOp::IncrementRecordInteger { key, .. }
            | WriteOp::IncrementScalarDecimal { key, .. }
            | WriteOp::AddToSet { key, .. }
            | WriteOp::AppendToList { key, .. } => key,
        }
    }
}

/// Key-value primitives the ledger is built on.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Members of a set; empty when the key is absent
    async fn read_set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Union `members` into a set
    async fn add_to_set(&self, key: &str, members: &[String]) -> Result<(), StoreError>;

    /// String value; `""` when the key is absent
    async fn read_scalar(&self, key: &str) -> Result<String, StoreError>;

    /// Overwrite a scalar
    async fn write_scalar(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Add `delta` to an integer scalar and return the new value
    async fn increment_scalar_integer(&self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Add `delta` to a decimal string, creating it at `delta` if absent
    async fn increment_scalar_decimal(&self, key: &str, delta: Decimal) -> Result<(), StoreError>;

    /// All fields of a record; empty when the key is absent
    async fn read_record(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    async fn increment_record_field_integer(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError>;

    async fn increment_record_field_decimal(
        &self,
        key: &str,
        field: &str,
        delta: Decimal,
    ) -> Result<(), StoreError>;

    /// Atomic counter starting at 1
    async fn next_sequence(&self, key: &str) -> Result<u64, StoreError> {
        let value = self.increment_scalar_integer(key, 1).await?;
        u64::try_from(value).map_err(|_| StoreError::NotANumber { key: key.to_string() })
    }

    async fn append_to_list(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Whole list in insertion order; empty when the key is absent
    async fn read_list(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Apply every op or none of them.
    async fn apply_atomic(&self, ops: &[WriteOp]) -> Result<(), StoreError>;

    /// Apply a single planned op through the matching primitive.
    async fn apply(&self, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::IncrementRecordDecimal { key, field, delta } => {
                self.increment_record_field_decimal(key, field, *delta).await
            }
            WriteOp::IncrementRecordInteger { key, field, delta } => {
                self.increment_record_field_integer(key, field, *delta).await
            }
            WriteOp::IncrementScalarDecimal { key, delta } => {
                self.increment_scalar_decimal(key, *delta).await
            }
            WriteOp::AddToSet { key, members } => self.add_to_set(key, members).await,
            WriteOp::AppendToList { key, value } => self.append_to_list(key, value).await,
        }
    }
}
