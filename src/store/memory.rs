//! In-process ledger store.
//!
//! Mirrors the Redis semantics the ledger relies on (absent keys read as
//! empty, increments create keys, sets deduplicate). Used by tests and local
//! runs without a server. Supports write-failure injection so partial
//! application can be exercised.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use crate::domain::amount::{encode_amount, parse_stored_amount};

use super::{LedgerStore, StoreError, WriteOp};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default)]
struct State {
    data: HashMap<String, Value>,
    writes: usize,
    /// Writes still allowed before injected failures start
    remaining_writes: Option<usize>,
}

impl State {
    fn admit(&mut self, operation: &'static str, key: &str) -> Result<(), StoreError> {
        if let Some(remaining) = self.remaining_writes.as_mut() {
            if *remaining == 0 {
                return Err(StoreError::Unavailable {
                    operation,
                    key: key.to_string(),
                });
            }
            *remaining -= 1;
        }
        self.writes += 1;
        Ok(())
    }

    fn hash_mut(&mut self, key: &str) -> Result<&mut HashMap<String, String>, StoreError> {
        match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()))
        {
            Value::Hash(fields) => Ok(fields),
            _ => Err(StoreError::WrongType { key: key.to_string() }),
        }
    }

    fn incr_hash_integer(&mut self, key: &str, field: &str, delta: i64) -> Result<(), StoreError> {
        self.admit("HINCRBY", key)?;
        let fields = self.hash_mut(key)?;
        let current = match fields.get(field) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| StoreError::NotANumber { key: key.to_string() })?,
            None => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::NotANumber { key: key.to_string() })?;
        fields.insert(field.to_string(), next.to_string());
        Ok(())
    }

    fn incr_hash_decimal(&mut self, key: &str, field: &str, delta: Decimal) -> Result<(), StoreError> {
        self.admit("HINCRBYFLOAT", key)?;
        let fields = self.hash_mut(key)?;
        let current = match fields.get(field) {
            Some(raw) => parse_stored_amount(raw)
                .map_err(|_| StoreError::NotANumber { key: key.to_string() })?,
            None => Decimal::ZERO,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::NotANumber { key: key.to_string() })?;
        fields.insert(field.to_string(), encode_amount(next));
        Ok(())
    }

    fn incr_scalar_decimal(&mut self, key: &str, delta: Decimal) -> Result<(), StoreError> {
        self.admit("INCRBYFLOAT", key)?;
        let current = match self.data.get(key) {
            Some(Value::Str(raw)) => parse_stored_amount(raw)
                .map_err(|_| StoreError::NotANumber { key: key.to_string() })?,
            Some(_) => return Err(StoreError::WrongType { key: key.to_string() }),
            None => Decimal::ZERO,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::NotANumber { key: key.to_string() })?;
        self.data
            .insert(key.to_string(), Value::Str(encode_amount(next)));
        Ok(())
    }

    fn add_to_set(&mut self, key: &str, members: &[String]) -> Result<(), StoreError> {
        if members.is_empty() {
            return Ok(());
        }
        self.admit("SADD", key)?;
        match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(HashSet::new()))
        {
            Value::Set(set) => {
                set.extend(members.iter().cloned());
                Ok(())
            }
            _ => Err(StoreError::WrongType { key: key.to_string() }),
        }
    }

    fn append_to_list(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.admit("RPUSH", key)?;
        match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()))
        {
            Value::List(items) => {
                items.push(value.to_string());
                Ok(())
            }
            _ => Err(StoreError::WrongType { key: key.to_string() }),
        }
    }

    fn apply(&mut self, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::IncrementRecordDecimal { key, field, delta } => {
                self.incr_hash_decimal(key, field, *delta)
            }
            WriteOp::IncrementRecordInteger { key, field, delta } => {
                self.incr_hash_integer(key, field, *delta)
            }
            WriteOp::IncrementScalarDecimal { key, delta } => self.incr_scalar_decimal(key, *delta),
            WriteOp::AddToSet { key, members } => self.add_to_set(key, members),
            WriteOp::AppendToList { key, value } => self.append_to_list(key, value),
        }
    }
}

/// Ledger store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutations applied so far
    pub async fn write_count(&self) -> usize {
        self.state.lock().await.writes
    }

    /// Let `allowed` more writes through, then fail every write after them.
    pub async fn fail_after_writes(&self, allowed: usize) {
        self.state.lock().await.remaining_writes = Some(allowed);
    }

    /// Stop injecting failures
    pub async fn heal(&self) {
        self.state.lock().await.remaining_writes = None;
    }

    /// Overwrite one field of a record verbatim
    pub async fn set_record_field(&self, key: &str, field: &str, value: &str) {
        let mut state = self.state.lock().await;
        let entry = state
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));
        if let Value::Hash(fields) = &mut *entry {
            fields.insert(field.to_string(), value.to_string());
        } else {
            let mut record = HashMap::new();
            record.insert(field.to_string(), value.to_string());
            *entry = Value::Hash(record);
        }
    }

    /// Whether a key holds any value
    pub async fn contains_key(&self, key: &str) -> bool {
        self.state.lock().await.data.contains_key(key)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn read_set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.state.lock().await.data.get(key) {
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(StoreError::WrongType { key: key.to_string() }),
            None => Ok(Vec::new()),
        }
    }

    async fn add_to_set(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        self.state.lock().await.add_to_set(key, members)
    }

    async fn read_scalar(&self, key: &str) -> Result<String, StoreError> {
        match self.state.lock().await.data.get(key) {
            Some(Value::Str(value)) => Ok(value.clone()),
            Some(_) => Err(StoreError::WrongType { key: key.to_string() }),
            None => Ok(String::new()),
        }
    }

    async fn write_scalar(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.admit("SET", key)?;
        state.data.insert(key.to_string(), Value::Str(value.to_string()));
        Ok(())
    }

    async fn increment_scalar_integer(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut state = self.state.lock().await;
        state.admit("INCRBY", key)?;
        let current = match state.data.get(key) {
            Some(Value::Str(raw)) => raw
                .parse::<i64>()
                .map_err(|_| StoreError::NotANumber { key: key.to_string() })?,
            Some(_) => return Err(StoreError::WrongType { key: key.to_string() }),
            None => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::NotANumber { key: key.to_string() })?;
        state.data.insert(key.to_string(), Value::Str(next.to_string()));
        Ok(next)
    }

    async fn increment_scalar_decimal(&self, key: &str, delta: Decimal) -> Result<(), StoreError> {
        self.state.lock().await.incr_scalar_decimal(key, delta)
    }

    async fn read_record(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        match self.state.lock().await.data.get(key) {
            Some(Value::Hash(fields)) => Ok(fields.clone()),
            Some(_) => Err(StoreError::WrongType { key: key.to_string() }),
            None => Ok(HashMap::new()),
        }
    }

    async fn increment_record_field_integer(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.state.lock().await.incr_hash_integer(key, field, delta)
    }

    async fn increment_record_field_decimal(
        &self,
        key: &str,
        field: &str,
        delta: Decimal,
    ) -> Result<(), StoreError> {
        self.state.lock().await.incr_hash_decimal(key, field, delta)
    }

    async fn append_to_list(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state.lock().await.append_to_list(key, value)
    }

    async fn read_list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.state.lock().await.data.get(key) {
            Some(Value::List(items)) => Ok(items.clone()),
            Some(_) => Err(StoreError::WrongType { key: key.to_string() }),
            None => Ok(Vec::new()),
        }
    }

    /// Apply the batch to a scratch copy and swap it in only if every op
    /// succeeded.
    async fn apply_atomic(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let mut scratch = state.clone();
        for op in ops {
            scratch.apply(op)?;
        }
        *state = scratch;
        Ok(())
    }
}
