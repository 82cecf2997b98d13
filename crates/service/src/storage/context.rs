use std::marker::PhantomData;
use std::sync::Arc;

use configs::AppConfig;
use models::ModelName;
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use super::{build_strategy, from_record, to_record, StorageError, StorageStrategy};

/// Façade over the one strategy chosen at construction.
///
/// Clones share the same strategy. Model-scoped CRUD goes through the
/// [`ModelContext`] returned by [`get_context`](Self::get_context).
#[derive(Clone)]
pub struct ApplicationDbContext {
    strategy: Arc<dyn StorageStrategy>,
}

impl ApplicationDbContext {
    /// Bind to the backend named by `storage.source`.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let ctx = Self::with_strategy(build_strategy(cfg.storage.source, &cfg.database));
        info!(strategy = ctx.strategy_name(), "storage strategy selected");
        ctx
    }

    pub fn with_strategy(strategy: Arc<dyn StorageStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub async fn connect(&self) -> Result<(), StorageError> {
        self.strategy.connect().await
    }

    pub async fn disconnect(&self) -> Result<(), StorageError> {
        self.strategy.disconnect().await
    }

    /// Register `model` on the strategy and return a context bound to it.
    pub fn get_context<T>(&self, model: ModelName) -> ModelContext<T> {
        self.strategy.register_model(model);
        info!(%model, "model context registered");
        ModelContext { strategy: Arc::clone(&self.strategy), model, _record: PhantomData }
    }
}

/// CRUD on one model, with records converted to `T`.
pub struct ModelContext<T> {
    strategy: Arc<dyn StorageStrategy>,
    model: ModelName,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ModelContext<T> {
    fn clone(&self) -> Self {
        Self { strategy: Arc::clone(&self.strategy), model: self.model, _record: PhantomData }
    }
}

impl<T: DeserializeOwned> ModelContext<T> {
    pub fn model(&self) -> ModelName {
        self.model
    }

    pub async fn get_all(&self) -> Result<Vec<T>, StorageError> {
        let records = self.strategy.get_all(self.model).await?;
        records.into_iter().map(from_record).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<T>, StorageError> {
        self.strategy.get_by_id(self.model, id).await?.map(from_record).transpose()
    }

    /// Store `data` (the record without its id) and return it with the assigned id.
    pub async fn create<I: Serialize + Sync>(&self, data: &I) -> Result<T, StorageError> {
        let record = to_record(data)?;
        from_record(self.strategy.create(self.model, record).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.strategy.delete(self.model, id).await
    }
}
