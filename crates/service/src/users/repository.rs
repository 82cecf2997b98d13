use async_trait::async_trait;
use models::user::{self, NewUser};

use crate::storage::{ModelContext, StorageError, StorageManager};

/// Repository abstraction for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<user::Model>, StorageError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<user::Model>, StorageError>;
    async fn create(&self, user: NewUser) -> Result<user::Model, StorageError>;
    async fn delete(&self, id: i64) -> Result<bool, StorageError>;
}

/// Repository backed by whichever strategy the storage manager is bound to.
///
/// Holds its own context bound to the `User` model, taken once at construction.
#[derive(Clone)]
pub struct StorageUserRepository {
    context: ModelContext<user::Model>,
}

impl StorageUserRepository {
    pub fn new(manager: &StorageManager) -> Self {
        Self { context: manager.get_application_db_context(user::MODEL_NAME) }
    }
}

#[async_trait]
impl UserRepository for StorageUserRepository {
    async fn get_all(&self) -> Result<Vec<user::Model>, StorageError> {
        self.context.get_all().await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<user::Model>, StorageError> {
        self.context.get_by_id(id).await
    }

    async fn create(&self, user: NewUser) -> Result<user::Model, StorageError> {
        self.context.create(&user).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.context.delete(id).await
    }
}
