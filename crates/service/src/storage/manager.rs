use configs::AppConfig;
use models::ModelName;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::{ApplicationDbContext, ModelContext};

/// Outcome of the last lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageStatus {
    Uninitialized,
    Ready,
    /// The step failed; the process keeps running on whatever state is in memory.
    Degraded { reason: String },
    Disposed,
}

impl StorageStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StorageStatus::Degraded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            StorageStatus::Uninitialized => "uninitialized",
            StorageStatus::Ready => "ready",
            StorageStatus::Degraded { .. } => "degraded",
            StorageStatus::Disposed => "disposed",
        }
    }
}

/// Owns the [`ApplicationDbContext`] lifecycle and hands out model contexts.
///
/// Lifecycle failures are logged and reported as [`StorageStatus::Degraded`];
/// they never abort the caller.
pub struct StorageManager {
    context: ApplicationDbContext,
    status: RwLock<StorageStatus>,
}

impl StorageManager {
    pub fn new(context: ApplicationDbContext) -> Self {
        Self { context, status: RwLock::new(StorageStatus::Uninitialized) }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(ApplicationDbContext::from_config(cfg))
    }

    /// Connect the bound strategy.
    pub async fn initialize(&self) -> StorageStatus {
        let status = match self.context.connect().await {
            Ok(()) => {
                info!(strategy = self.context.strategy_name(), "storage initialized");
                StorageStatus::Ready
            }
            Err(e) => {
                error!(strategy = self.context.strategy_name(), error = %e, "storage failed to initialize; continuing degraded");
                StorageStatus::Degraded { reason: e.to_string() }
            }
        };
        *self.status.write().await = status.clone();
        status
    }

    /// Disconnect (and for the file-backed store, flush) the bound strategy.
    ///
    /// A second call after a successful dispose does nothing.
    pub async fn dispose(&self) -> StorageStatus {
        let mut current = self.status.write().await;
        if *current == StorageStatus::Disposed {
            return StorageStatus::Disposed;
        }
        let status = match self.context.disconnect().await {
            Ok(()) => {
                info!(strategy = self.context.strategy_name(), "storage disposed");
                StorageStatus::Disposed
            }
            Err(e) => {
                error!(strategy = self.context.strategy_name(), error = %e, "storage failed to dispose");
                StorageStatus::Degraded { reason: e.to_string() }
            }
        };
        *current = status.clone();
        status
    }

    pub async fn status(&self) -> StorageStatus {
        self.status.read().await.clone()
    }

    pub fn context(&self) -> &ApplicationDbContext {
        &self.context
    }

    /// Context bound to `model`; repositories request one at construction and keep it.
    pub fn get_application_db_context<T>(&self, model: ModelName) -> ModelContext<T> {
        self.context.get_context(model)
    }
}
