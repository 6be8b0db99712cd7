//! Redis-backed ledger store.
//!
//! Uses a tokio `ConnectionManager` (cheap to clone, reconnects on its own).
//! Every command is bounded by the configured timeout.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Cmd, FromRedisValue, Pipeline};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::amount::encode_amount;

use super::{LedgerStore, StoreError, WriteOp};

/// Store adapter over a Redis server
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `timeout` - deadline applied to every command
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| StoreError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Connection(format!("timed out connecting to {redis_url}")))?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { conn, timeout })
    }

    /// Round-trip a PING to verify connectivity
    pub async fn ping(&self) -> Result<(), StoreError> {
        let _: String = self.run("PING", "", &redis::cmd("PING")).await?;
        Ok(())
    }

    async fn run<T>(&self, operation: &'static str, key: &str, cmd: &Cmd) -> Result<T, StoreError>
    where
        T: FromRedisValue + Send,
    {
        let mut conn = self.conn.clone();
        match tokio::time::timeout(self.timeout, cmd.query_async::<_, T>(&mut conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(StoreError::Command {
                operation,
                key: key.to_string(),
                source,
            }),
            Err(_) => Err(self.timeout_error(operation, key)),
        }
    }

    fn timeout_error(&self, operation: &'static str, key: &str) -> StoreError {
        StoreError::Timeout {
            operation,
            key: key.to_string(),
            timeout_ms: timeout_millis(self.timeout),
        }
    }
}

/// Whole milliseconds of a deadline, saturating at `u64::MAX`.
fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Queue one planned op on a pipeline.
fn queue(pipe: &mut Pipeline, op: &WriteOp) {
    match op {
        WriteOp::IncrementRecordDecimal { key, field, delta } => {
            pipe.cmd("HINCRBYFLOAT")
                .arg(key)
                .arg(*field)
                .arg(encode_amount(*delta))
                .ignore();
        }
        WriteOp::IncrementRecordInteger { key, field, delta } => {
            pipe.cmd("HINCRBY").arg(key).arg(*field).arg(*delta).ignore();
        }
        WriteOp::IncrementScalarDecimal { key, delta } => {
            pipe.cmd("INCRBYFLOAT")
                .arg(key)
                .arg(encode_amount(*delta))
                .ignore();
        }
        WriteOp::AddToSet { key, members } => {
            if !members.is_empty() {
                pipe.cmd("SADD").arg(key).arg(members).ignore();
            }
        }
        WriteOp::AppendToList { key, value } => {
            pipe.cmd("RPUSH").arg(key).arg(value).ignore();
        }
    }
}

#[async_trait]
impl LedgerStore for RedisStore {
    async fn read_set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.run("SMEMBERS", key, redis::cmd("SMEMBERS").arg(key)).await
    }

    async fn add_to_set(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        if members.is_empty() {
            return Ok(());
        }
        let _: i64 = self
            .run("SADD", key, redis::cmd("SADD").arg(key).arg(members))
            .await?;
        Ok(())
    }

    async fn read_scalar(&self, key: &str) -> Result<String, StoreError> {
        let value: Option<String> = self.run("GET", key, redis::cmd("GET").arg(key)).await?;
        Ok(value.unwrap_or_default())
    }

    async fn write_scalar(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _: () = self.run("SET", key, redis::cmd("SET").arg(key).arg(value)).await?;
        Ok(())
    }

    async fn increment_scalar_integer(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        self.run("INCRBY", key, redis::cmd("INCRBY").arg(key).arg(delta))
            .await
    }

    async fn increment_scalar_decimal(&self, key: &str, delta: Decimal) -> Result<(), StoreError> {
        let _: String = self
            .run(
                "INCRBYFLOAT",
                key,
                redis::cmd("INCRBYFLOAT").arg(key).arg(encode_amount(delta)),
            )
            .await?;
        Ok(())
    }

    async fn read_record(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.run("HGETALL", key, redis::cmd("HGETALL").arg(key)).await
    }

    async fn increment_record_field_integer(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        let _: i64 = self
            .run("HINCRBY", key, redis::cmd("HINCRBY").arg(key).arg(field).arg(delta))
            .await?;
        Ok(())
    }

    async fn increment_record_field_decimal(
        &self,
        key: &str,
        field: &str,
        delta: Decimal,
    ) -> Result<(), StoreError> {
        let _: String = self
            .run(
                "HINCRBYFLOAT",
                key,
                redis::cmd("HINCRBYFLOAT")
                    .arg(key)
                    .arg(field)
                    .arg(encode_amount(delta)),
            )
            .await?;
        Ok(())
    }

    async fn append_to_list(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _: i64 = self
            .run("RPUSH", key, redis::cmd("RPUSH").arg(key).arg(value))
            .await?;
        Ok(())
    }

    async fn read_list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.run("LRANGE", key, redis::cmd("LRANGE").arg(key).arg(0).arg(-1))
            .await
    }

    /// MULTI/EXEC the whole batch.
    ///
    /// Other clients never observe a partial batch. Redis does not roll back
    /// commands that fail inside EXEC (e.g. WRONGTYPE on a corrupted key), so
    /// that case can still leave the batch partially applied.
    #[instrument(skip(self, ops), fields(ops = ops.len()), err)]
    async fn apply_atomic(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let Some(first) = ops.first() else {
            return Ok(());
        };

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in ops {
            queue(&mut pipe, op);
        }

        let mut conn = self.conn.clone();
        match tokio::time::timeout(self.timeout, pipe.query_async::<_, ()>(&mut conn)).await {
            Ok(Ok(())) => {
                debug!(first_key = first.key(), "atomic batch committed");
                Ok(())
            }
            Ok(Err(source)) => Err(StoreError::Command {
                operation: "EXEC",
                key: first.key().to_string(),
                source,
            }),
            Err(_) => Err(self.timeout_error("EXEC", first.key())),
        }
    }
}
