use sea_orm::{entity::prelude::*, ActiveValue::NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::ModelName;

/// Collection the user records live in.
pub const MODEL_NAME: ModelName = ModelName::USER;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub email: String,
    pub username: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// User data as submitted by a client; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_email(&self.email)?;
        validate_username(&self.username)
    }

    pub fn into_active_model(self) -> ActiveModel {
        ActiveModel { id: NotSet, email: Set(self.email), username: Set(self.username) }
    }
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    if email.trim().is_empty() {
        return Err(ModelError::Validation("Email is required".into()));
    }
    let invalid = || ModelError::Validation("Please enter a valid email address".into());
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    if username.trim().is_empty() {
        return Err(ModelError::Validation("Username is required".into()));
    }
    Ok(())
}
