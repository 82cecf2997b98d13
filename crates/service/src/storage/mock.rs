//! Disk-free strategy for tests and doc examples.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use models::ModelName;
use serde_json::Value;

use super::{record_id, ModelRegistry, Record, StorageError, StorageStrategy};

#[derive(Default)]
struct MockTable {
    rows: Vec<Record>,
    next_id: i64,
}

/// Keeps records in a plain `HashMap` and can be told to fail the lifecycle calls.
#[derive(Default)]
pub struct MockStrategy {
    tables: Mutex<HashMap<ModelName, MockTable>>,
    registry: ModelRegistry,
    fail_connect: bool,
    fail_disconnect: bool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl MockStrategy {
    /// A strategy whose `connect` and `disconnect` both fail with an I/O error.
    pub fn failing() -> Self {
        Self { fail_connect: true, fail_disconnect: true, ..Self::default() }
    }

    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageStrategy for MockStrategy {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self) -> Result<(), StorageError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(StorageError::Io("mock connect failure".into()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), StorageError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_disconnect {
            return Err(StorageError::Io("mock disconnect failure".into()));
        }
        Ok(())
    }

    fn register_model(&self, model: ModelName) {
        self.registry.register(model);
    }

    async fn get_all(&self, model: ModelName) -> Result<Vec<Record>, StorageError> {
        self.registry.ensure(model)?;
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.get(&model).map(|t| t.rows.clone()).unwrap_or_default())
    }

    async fn get_by_id(&self, model: ModelName, id: i64) -> Result<Option<Record>, StorageError> {
        self.registry.ensure(model)?;
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(tables
            .get(&model)
            .and_then(|t| t.rows.iter().find(|r| record_id(r) == Some(id)))
            .cloned())
    }

    async fn create(&self, model: ModelName, mut data: Record) -> Result<Record, StorageError> {
        self.registry.ensure(model)?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(model).or_default();
        data.insert("id".into(), Value::from(table.next_id));
        table.next_id += 1;
        table.rows.push(data.clone());
        Ok(data)
    }

    async fn delete(&self, model: ModelName, id: i64) -> Result<bool, StorageError> {
        self.registry.ensure(model)?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(table) = tables.get_mut(&model) else {
            return Ok(false);
        };
        let before = table.rows.len();
        table.rows.retain(|r| record_id(r) != Some(id));
        Ok(table.rows.len() != before)
    }
}
