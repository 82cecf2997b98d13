use async_trait::async_trait;
use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::{user, ModelName};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{from_record, to_record, ModelRegistry, Record, StorageError, StorageStrategy};

/// Entity tables the database backend knows how to reach.
#[derive(Debug, Clone, Copy)]
enum Table {
    User,
}

impl Table {
    fn for_model(model: ModelName) -> Result<Self, StorageError> {
        if model == user::MODEL_NAME {
            Ok(Table::User)
        } else {
            Err(StorageError::UnknownTable(model))
        }
    }
}

fn db_err(e: DbErr) -> StorageError {
    StorageError::Database(e.to_string())
}

/// Adapter over a sea-orm connection; each model maps to one entity table.
pub struct DatabaseStrategy {
    config: DatabaseConfig,
    conn: RwLock<Option<DatabaseConnection>>,
    registry: ModelRegistry,
}

impl DatabaseStrategy {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, conn: RwLock::new(None), registry: ModelRegistry::default() }
    }

    async fn connection(&self) -> Result<DatabaseConnection, StorageError> {
        self.conn.read().await.clone().ok_or(StorageError::NotConnected)
    }

    async fn scoped(&self, model: ModelName) -> Result<(DatabaseConnection, Table), StorageError> {
        self.registry.ensure(model)?;
        let table = Table::for_model(model)?;
        Ok((self.connection().await?, table))
    }
}

#[async_trait]
impl StorageStrategy for DatabaseStrategy {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn connect(&self) -> Result<(), StorageError> {
        let db = models::db::connect_with_config(&self.config).await.map_err(db_err)?;
        if self.config.auto_migrate {
            migration::Migrator::up(&db, None).await.map_err(db_err)?;
        }
        *self.conn.write().await = Some(db);
        info!(max_connections = self.config.max_connections, "database connection established");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), StorageError> {
        let Some(db) = self.conn.write().await.take() else {
            return Ok(());
        };
        db.close().await.map_err(db_err)?;
        info!("database connection closed");
        Ok(())
    }

    fn register_model(&self, model: ModelName) {
        if self.registry.register(model) {
            debug!(%model, "model registered on database");
        }
    }

    async fn get_all(&self, model: ModelName) -> Result<Vec<Record>, StorageError> {
        let (db, table) = self.scoped(model).await?;
        match table {
            Table::User => {
                let rows = user::Entity::find()
                    .order_by_asc(user::Column::Id)
                    .all(&db)
                    .await
                    .map_err(db_err)?;
                rows.iter().map(to_record).collect()
            }
        }
    }

    async fn get_by_id(&self, model: ModelName, id: i64) -> Result<Option<Record>, StorageError> {
        let (db, table) = self.scoped(model).await?;
        match table {
            Table::User => {
                let row = user::Entity::find_by_id(id).one(&db).await.map_err(db_err)?;
                row.as_ref().map(to_record).transpose()
            }
        }
    }

    async fn create(&self, model: ModelName, mut data: Record) -> Result<Record, StorageError> {
        let (db, table) = self.scoped(model).await?;
        data.remove("id");
        match table {
            Table::User => {
                let input: user::NewUser = from_record(data)?;
                let created = input.into_active_model().insert(&db).await.map_err(db_err)?;
                to_record(&created)
            }
        }
    }

    async fn delete(&self, model: ModelName, id: i64) -> Result<bool, StorageError> {
        let (db, table) = self.scoped(model).await?;
        let result = match table {
            Table::User => user::Entity::delete_by_id(id).exec(&db).await.map_err(db_err)?,
        };
        Ok(result.rows_affected > 0)
    }
}
