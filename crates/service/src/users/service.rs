use std::sync::Arc;

use models::user::{self, NewUser};
use tracing::{info, warn};

use super::repository::UserRepository;
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_all_users(&self) -> Result<Vec<user::Model>, ServiceError> {
        Ok(self.repo.get_all().await?)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<user::Model>, ServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Validate and store a new user.
    pub async fn create_user(&self, input: NewUser) -> Result<user::Model, ServiceError> {
        if let Err(e) = input.validate() {
            warn!(error = %e, "rejected user input");
            return Err(e.into());
        }
        let created = self.repo.create(input).await?;
        info!(user_id = created.id, "user created");
        Ok(created)
    }

    /// Returns `false` when no user has this id.
    pub async fn delete_user(&self, id: i64) -> Result<bool, ServiceError> {
        if self.repo.get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        let deleted = self.repo.delete(id).await?;
        if deleted {
            info!(user_id = id, "user deleted");
        }
        Ok(deleted)
    }
}
