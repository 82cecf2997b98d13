use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use configs::{DatabaseConfig, StorageSource};
use models::ModelName;

use super::{DatabaseStrategy, InMemoryStrategy, Record, StorageError};

/// Contract every storage backend implements.
///
/// Every CRUD call names the model it targets, so one strategy instance can
/// serve any number of models concurrently. A model must be registered before
/// it is used.
#[async_trait]
pub trait StorageStrategy: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn connect(&self) -> Result<(), StorageError>;
    async fn disconnect(&self) -> Result<(), StorageError>;

    fn register_model(&self, model: ModelName);

    /// All records of `model` in insertion order.
    async fn get_all(&self, model: ModelName) -> Result<Vec<Record>, StorageError>;
    async fn get_by_id(&self, model: ModelName, id: i64) -> Result<Option<Record>, StorageError>;
    /// Store `data` under a freshly assigned id; any `id` in `data` is ignored.
    async fn create(&self, model: ModelName, data: Record) -> Result<Record, StorageError>;
    async fn delete(&self, model: ModelName, id: i64) -> Result<bool, StorageError>;
}

/// Set of models registered on one strategy.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Mutex<BTreeSet<ModelName>>,
}

impl ModelRegistry {
    /// Returns `true` if the model was not registered before.
    pub fn register(&self, model: ModelName) -> bool {
        self.models.lock().unwrap_or_else(PoisonError::into_inner).insert(model)
    }

    pub fn is_registered(&self, model: ModelName) -> bool {
        self.models.lock().unwrap_or_else(PoisonError::into_inner).contains(&model)
    }

    pub fn ensure(&self, model: ModelName) -> Result<(), StorageError> {
        if self.is_registered(model) {
            Ok(())
        } else {
            Err(StorageError::UnregisteredModel(model))
        }
    }
}

/// Pick the backend for the configured source. Resolved once at startup.
pub fn build_strategy(source: StorageSource, database: &DatabaseConfig) -> Arc<dyn StorageStrategy> {
    match source {
        StorageSource::Database => Arc::new(DatabaseStrategy::new(database.clone())),
        StorageSource::Memory => Arc::new(InMemoryStrategy::new()),
    }
}
