use std::path::PathBuf;
use std::sync::Arc;

use configs::{AppConfig, StorageSource};
use models::{user, ModelName};
use serde::{Deserialize, Serialize};

use super::mock::MockStrategy;
use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: i64,
    total: u32,
}

#[derive(Serialize)]
struct NewOrder {
    total: u32,
}

const ORDER: ModelName = ModelName::new("Order");

fn temp_db() -> PathBuf {
    std::env::temp_dir().join(format!("storage_ctx_{}", uuid::Uuid::new_v4())).join("db.json")
}

fn new_user(n: usize) -> user::NewUser {
    user::NewUser { email: format!("user{n}@example.com"), username: format!("user{n}") }
}

/// CRUD assertions every backend has to satisfy, driven through the manager.
async fn crud_contract(manager: &StorageManager) -> Result<(), anyhow::Error> {
    assert_eq!(manager.initialize().await, StorageStatus::Ready);

    let users = manager.get_application_db_context::<user::Model>(user::MODEL_NAME);
    let orders = manager.get_application_db_context::<Order>(ORDER);

    assert!(users.get_all().await?.is_empty());
    assert!(users.get_by_id(0).await?.is_none());

    let mut created = Vec::new();
    for n in 0..3 {
        created.push(users.create(&new_user(n)).await?);
    }
    let ids: Vec<i64> = created.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(created[1].email, "user1@example.com");

    assert_eq!(users.get_all().await?, created);
    assert_eq!(users.get_by_id(1).await?, Some(created[1].clone()));
    assert!(users.get_by_id(7).await?.is_none());

    assert!(users.delete(1).await?);
    assert_eq!(users.get_all().await?.len(), 2);
    assert!(!users.delete(1).await?);
    assert_eq!(users.get_all().await?.len(), 2);
    assert!(users.get_by_id(1).await?.is_none());

    // other models never see user records
    assert!(orders.get_all().await?.is_empty());
    assert!(orders.get_by_id(0).await?.is_none());
    let order = orders.create(&NewOrder { total: 12 }).await?;
    assert_eq!(order, Order { id: 0, total: 12 });
    assert_eq!(users.get_all().await?.len(), 2);

    assert_eq!(manager.dispose().await, StorageStatus::Disposed);
    Ok(())
}

#[tokio::test]
async fn in_memory_backend_satisfies_contract() -> Result<(), anyhow::Error> {
    let path = temp_db();
    let manager = StorageManager::new(ApplicationDbContext::with_strategy(Arc::new(InMemoryStrategy::with_path(&path))));
    crud_contract(&manager).await?;
    if let Some(dir) = path.parent() {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
    Ok(())
}

#[tokio::test]
async fn mock_backend_satisfies_contract() -> Result<(), anyhow::Error> {
    let manager = StorageManager::new(ApplicationDbContext::with_strategy(Arc::new(MockStrategy::default())));
    crud_contract(&manager).await
}

#[tokio::test]
async fn contexts_for_different_models_do_not_interfere() -> Result<(), anyhow::Error> {
    let ctx = ApplicationDbContext::with_strategy(Arc::new(MockStrategy::default()));
    let users = ctx.get_context::<user::Model>(user::MODEL_NAME);
    // binding a second model on the same context leaves the first one alone
    let orders = ctx.get_context::<Order>(ORDER);
    let again = ctx.get_context::<user::Model>(user::MODEL_NAME);

    users.create(&new_user(1)).await?;
    assert_eq!(users.model(), user::MODEL_NAME);
    assert_eq!(again.get_all().await?.len(), 1);
    assert!(orders.get_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn records_that_do_not_fit_the_type_are_serialization_errors() -> Result<(), anyhow::Error> {
    let ctx = ApplicationDbContext::with_strategy(Arc::new(MockStrategy::default()));
    let orders = ctx.get_context::<Order>(ORDER);
    // a user-shaped row has no `total`
    let err = orders.create(&new_user(1)).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));

    // non-object input is rejected before it reaches the backend
    let err = orders.create(&42u32).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
    Ok(())
}

#[tokio::test]
async fn initialize_failure_is_reported_not_raised() {
    let strategy = Arc::new(MockStrategy::failing());
    let manager = StorageManager::new(ApplicationDbContext::with_strategy(strategy.clone()));
    assert_eq!(manager.status().await, StorageStatus::Uninitialized);

    let status = manager.initialize().await;
    assert!(status.is_degraded());
    assert_eq!(manager.status().await.label(), "degraded");
    assert_eq!(strategy.connect_calls(), 1);

    let status = manager.dispose().await;
    assert!(matches!(status, StorageStatus::Degraded { ref reason } if reason.contains("disconnect")));
    assert_eq!(strategy.disconnect_calls(), 1);
}

#[tokio::test]
async fn degraded_in_memory_store_still_answers() -> Result<(), anyhow::Error> {
    // the data file path is a directory, so connect fails
    let path = temp_db();
    tokio::fs::create_dir_all(&path).await?;
    let manager = StorageManager::new(ApplicationDbContext::with_strategy(Arc::new(InMemoryStrategy::with_path(&path))));

    assert!(manager.initialize().await.is_degraded());
    let users = manager.get_application_db_context::<user::Model>(user::MODEL_NAME);
    assert!(users.get_all().await?.is_empty());
    assert!(users.get_by_id(0).await?.is_none());

    if let Some(dir) = path.parent() {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
    Ok(())
}

#[tokio::test]
async fn dispose_runs_once() {
    let strategy = Arc::new(MockStrategy::default());
    let manager = StorageManager::new(ApplicationDbContext::with_strategy(strategy.clone()));
    manager.initialize().await;
    assert_eq!(manager.dispose().await, StorageStatus::Disposed);
    assert_eq!(manager.dispose().await, StorageStatus::Disposed);
    assert_eq!(strategy.disconnect_calls(), 1);
}

#[tokio::test]
async fn in_memory_round_trip_through_manager() -> Result<(), anyhow::Error> {
    let path = temp_db();
    let first = StorageManager::new(ApplicationDbContext::with_strategy(Arc::new(InMemoryStrategy::with_path(&path))));
    first.initialize().await;
    let users = first.get_application_db_context::<user::Model>(user::MODEL_NAME);
    users.create(&new_user(1)).await?;
    users.create(&new_user(2)).await?;
    let before = users.get_all().await?;
    assert_eq!(first.dispose().await, StorageStatus::Disposed);

    let second = StorageManager::new(ApplicationDbContext::with_strategy(Arc::new(InMemoryStrategy::with_path(&path))));
    assert_eq!(second.initialize().await, StorageStatus::Ready);
    let users = second.get_application_db_context::<user::Model>(user::MODEL_NAME);
    assert_eq!(users.get_all().await?, before);

    if let Some(dir) = path.parent() {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
    Ok(())
}

#[test]
fn config_selects_strategy() {
    let mut cfg = AppConfig::default();
    assert_eq!(ApplicationDbContext::from_config(&cfg).strategy_name(), "memory");

    cfg.storage.source = StorageSource::Database;
    assert_eq!(ApplicationDbContext::from_config(&cfg).strategy_name(), "db");
}

#[test]
fn default_memory_path_is_fixed() {
    assert_eq!(InMemoryStrategy::new().path(), std::path::Path::new(DEFAULT_DB_PATH));
}
