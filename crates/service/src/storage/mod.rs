//! Storage abstractions for the service layer
//!
//! Callers above [`StorageManager`] perform CRUD against a named model through
//! a [`ModelContext`] and never learn which [`StorageStrategy`] is bound:
//! the file-backed [`InMemoryStrategy`], the sea-orm [`DatabaseStrategy`], or a
//! test double such as [`mock::MockStrategy`].

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

mod context;
mod database;
mod error;
mod in_memory;
mod manager;
pub mod mock;
mod strategy;

pub use context::{ApplicationDbContext, ModelContext};
pub use database::DatabaseStrategy;
pub use error::StorageError;
pub use in_memory::{InMemoryStrategy, DEFAULT_DB_PATH};
pub use manager::{StorageManager, StorageStatus};
pub use strategy::{build_strategy, ModelRegistry, StorageStrategy};

/// One stored row: field name to value, always carrying an integer `id`.
pub type Record = serde_json::Map<String, Value>;

/// Integer id of a record, if it has one.
pub fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

pub(crate) fn to_record<T: Serialize + ?Sized>(data: &T) -> Result<Record, StorageError> {
    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StorageError::Serialization(format!("expected a JSON object, got {other}"))),
        Err(e) => Err(StorageError::Serialization(e.to_string())),
    }
}

pub(crate) fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, StorageError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests;
