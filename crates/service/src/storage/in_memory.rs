use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use models::ModelName;
use serde_json::Value;
use tokio::{fs, sync::RwLock};
use tracing::{debug, info, warn};

use super::{record_id, ModelRegistry, Record, StorageError, StorageStrategy};

/// Where the snapshot lives, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "in-memory-db/db.json";

type Snapshot = BTreeMap<String, Vec<Record>>;

#[derive(Default)]
struct Tables {
    data: Snapshot,
    /// Lowest id each model may hand out next; never moves backwards.
    next_ids: HashMap<String, i64>,
}

impl Tables {
    /// `None` once the highest stored id is `i64::MAX`.
    fn next_id(&self, key: &str) -> Option<i64> {
        let after_max = match self.data.get(key).into_iter().flatten().filter_map(record_id).max() {
            Some(max) => max.checked_add(1)?,
            None => 0,
        };
        Some(self.next_ids.get(key).copied().unwrap_or(0).max(after_max))
    }
}

/// Process-local tables, one per model, mirrored to a single JSON file.
///
/// The file is read once by [`connect`](StorageStrategy::connect) and written
/// once by [`disconnect`](StorageStrategy::disconnect); CRUD calls only touch
/// memory, so writes made between the two are lost if the process dies.
pub struct InMemoryStrategy {
    path: PathBuf,
    tables: RwLock<Tables>,
    registry: ModelRegistry,
}

impl Default for InMemoryStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStrategy {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_DB_PATH)
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), tables: RwLock::new(Tables::default()), registry: ModelRegistry::default() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, creating an empty file when there is none.
    async fn load(&self) -> Result<Snapshot, StorageError> {
        common::env::ensure_data_dir(&self.path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::write(&self.path, b"").await.map_err(|e| StorageError::Io(e.to_string()))?;
                info!(path = %self.path.display(), "created empty in-memory store file");
                Vec::new()
            }
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        Ok(parse_snapshot(&self.path, &bytes))
    }
}

/// Empty content reads as `{}`. Malformed content is logged and treated as an
/// empty store; it is replaced on the next flush.
fn parse_snapshot(path: &Path, bytes: &[u8]) -> Snapshot {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Snapshot::new();
    }
    match serde_json::from_slice::<Snapshot>(bytes) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed in-memory store file; starting empty");
            Snapshot::new()
        }
    }
}

#[async_trait]
impl StorageStrategy for InMemoryStrategy {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<(), StorageError> {
        let snapshot = self.load().await?;
        let mut tables = self.tables.write().await;
        *tables = Tables { data: snapshot, next_ids: HashMap::new() };
        info!(path = %self.path.display(), models = tables.data.len(), "in-memory store loaded");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), StorageError> {
        let tables = self.tables.read().await;
        let data = serde_json::to_vec_pretty(&tables.data).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let models = tables.data.len();
        drop(tables);

        common::env::ensure_data_dir(&self.path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        fs::write(&self.path, data).await.map_err(|e| StorageError::Io(e.to_string()))?;
        info!(path = %self.path.display(), models, "in-memory store flushed");
        Ok(())
    }

    fn register_model(&self, model: ModelName) {
        if self.registry.register(model) {
            debug!(%model, "model registered on in-memory store");
        }
    }

    async fn get_all(&self, model: ModelName) -> Result<Vec<Record>, StorageError> {
        self.registry.ensure(model)?;
        let tables = self.tables.read().await;
        Ok(tables.data.get(model.as_str()).cloned().unwrap_or_default())
    }

    async fn get_by_id(&self, model: ModelName, id: i64) -> Result<Option<Record>, StorageError> {
        self.registry.ensure(model)?;
        let tables = self.tables.read().await;
        let found = tables
            .data
            .get(model.as_str())
            .and_then(|table| table.iter().find(|r| record_id(r) == Some(id)))
            .cloned();
        Ok(found)
    }

    async fn create(&self, model: ModelName, mut data: Record) -> Result<Record, StorageError> {
        self.registry.ensure(model)?;
        data.remove("id");

        let mut tables = self.tables.write().await;
        let id = tables.next_id(model.as_str()).ok_or(StorageError::IdExhausted(model))?;
        let mut record = Record::new();
        record.insert("id".into(), Value::from(id));
        record.extend(data);

        tables.data.entry(model.as_str().to_string()).or_default().push(record.clone());
        // the id after `i64::MAX` is reported by the next create
        match id.checked_add(1) {
            Some(next) => tables.next_ids.insert(model.as_str().to_string(), next),
            None => tables.next_ids.remove(model.as_str()),
        };
        debug!(%model, id, "record created");
        Ok(record)
    }

    async fn delete(&self, model: ModelName, id: i64) -> Result<bool, StorageError> {
        self.registry.ensure(model)?;
        let mut tables = self.tables.write().await;
        let key = model.as_str();
        let next = tables.next_id(key);

        let Some(table) = tables.data.get_mut(key) else {
            return Ok(false);
        };
        let Some(index) = table.iter().position(|r| record_id(r) == Some(id)) else {
            return Ok(false);
        };
        table.remove(index);
        if let Some(next) = next {
            tables.next_ids.insert(key.to_string(), next);
        }
        debug!(%model, id, "record deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER: ModelName = ModelName::USER;
    const ORDER: ModelName = ModelName::new("Order");

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("in_memory_strategy_{}", uuid::Uuid::new_v4()))
            .join("db.json")
    }

    fn user(email: &str) -> Record {
        super::super::to_record(&json!({ "email": email, "username": "bob" })).unwrap()
    }

    async fn connected(path: &Path) -> InMemoryStrategy {
        let store = InMemoryStrategy::with_path(path);
        store.connect().await.expect("connect");
        store.register_model(USER);
        store.register_model(ORDER);
        store
    }

    async fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn fresh_file_bootstrap() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;

        // connect creates the file, empty
        assert_eq!(fs::read(&path).await?.len(), 0);
        assert!(store.get_all(USER).await?.is_empty());
        assert!(store.get_all(ORDER).await?.is_empty());

        store.disconnect().await?;
        let written: Value = serde_json::from_slice(&fs::read(&path).await?)?;
        assert_eq!(written, json!({}));

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn ids_start_at_zero_and_follow_insert_count() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;

        for expected in 0..5 {
            let created = store.create(USER, user(&format!("u{expected}@example.com"))).await?;
            assert_eq!(record_id(&created), Some(expected));
        }

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn client_supplied_id_is_ignored() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;

        let mut data = user("a@example.com");
        data.insert("id".into(), json!(42));
        let created = store.create(USER, data).await?;
        assert_eq!(record_id(&created), Some(0));
        assert_eq!(created["email"], "a@example.com");

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reissued() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;

        store.create(USER, user("a@example.com")).await?;
        store.create(USER, user("b@example.com")).await?;
        let last = store.create(USER, user("c@example.com")).await?;
        assert!(store.delete(USER, record_id(&last).unwrap()).await?);
        assert!(store.delete(USER, 0).await?);

        let next = store.create(USER, user("d@example.com")).await?;
        assert_eq!(record_id(&next), Some(3));
        let ids: Vec<i64> = store.get_all(USER).await?.iter().filter_map(record_id).collect();
        assert_eq!(ids, vec![1, 3]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_semantics() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;

        store.create(USER, user("a@example.com")).await?;
        store.create(USER, user("b@example.com")).await?;

        assert!(store.delete(USER, 1).await?);
        assert_eq!(store.get_all(USER).await?.len(), 1);

        assert!(!store.delete(USER, 1).await?);
        assert!(!store.delete(USER, 99).await?);
        assert_eq!(store.get_all(USER).await?.len(), 1);

        // model with no table yet
        assert!(!store.delete(ORDER, 0).await?);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn models_are_isolated() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;

        let created = store.create(USER, user("a@example.com")).await?;
        let id = record_id(&created).unwrap();

        assert!(store.get_all(ORDER).await?.is_empty());
        assert!(store.get_by_id(ORDER, id).await?.is_none());
        assert!(store.get_by_id(USER, id).await?.is_some());

        let order = store.create(ORDER, super::super::to_record(&json!({ "total": 10 }))?).await?;
        assert_eq!(record_id(&order), Some(0));
        assert_eq!(store.get_all(USER).await?.len(), 1);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn round_trip_through_disk() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;
        store.create(USER, user("a@example.com")).await?;
        store.create(USER, user("b@example.com")).await?;
        store.create(ORDER, super::super::to_record(&json!({ "total": 3 }))?).await?;
        let users_before = store.get_all(USER).await?;
        let orders_before = store.get_all(ORDER).await?;
        store.disconnect().await?;

        let text = fs::read_to_string(&path).await?;
        assert!(text.contains("\n  \"Order\": ["), "expected 2-space indentation, got {text}");

        let reopened = connected(&path).await;
        assert_eq!(reopened.get_all(USER).await?, users_before);
        assert_eq!(reopened.get_all(ORDER).await?, orders_before);

        // ids continue after the highest persisted one
        let next = reopened.create(USER, user("c@example.com")).await?;
        assert_eq!(record_id(&next), Some(2));

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn writes_stay_in_memory_until_disconnect() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = connected(&path).await;
        store.create(USER, user("a@example.com")).await?;

        // nothing flushed yet, a fresh instance sees an empty store
        let other = connected(&path).await;
        assert!(other.get_all(USER).await?.is_empty());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_reads_as_empty() -> Result<(), anyhow::Error> {
        let path = temp_path();
        common::env::ensure_data_dir(&path).await?;
        fs::write(&path, b"{ not json").await?;

        let store = connected(&path).await;
        assert!(store.get_all(USER).await?.is_empty());
        let created = store.create(USER, user("a@example.com")).await?;
        assert_eq!(record_id(&created), Some(0));

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn id_space_exhaustion_is_an_error() -> Result<(), anyhow::Error> {
        let path = temp_path();
        common::env::ensure_data_dir(&path).await?;
        let snapshot = json!({ "User": [{ "id": i64::MAX, "email": "max@example.com", "username": "max" }] });
        fs::write(&path, serde_json::to_vec(&snapshot)?).await?;

        let store = connected(&path).await;
        let err = store.create(USER, user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StorageError::IdExhausted(m) if m == USER));
        assert_eq!(store.get_all(USER).await?.len(), 1);

        // other models keep their own id space
        let order = store.create(ORDER, super::super::to_record(&json!({ "total": 1 }))?).await?;
        assert_eq!(record_id(&order), Some(0));

        // deleting the top record frees the space again
        assert!(store.delete(USER, i64::MAX).await?);
        let created = store.create(USER, user("b@example.com")).await?;
        assert_eq!(record_id(&created), Some(0));

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn unregistered_model_is_rejected() -> Result<(), anyhow::Error> {
        let path = temp_path();
        let store = InMemoryStrategy::with_path(&path);
        store.connect().await?;

        let err = store.get_all(USER).await.unwrap_err();
        assert!(matches!(err, StorageError::UnregisteredModel(m) if m == USER));
        assert!(store.create(USER, user("a@example.com")).await.is_err());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_path_fails_connect() -> Result<(), anyhow::Error> {
        // a directory where the file should be
        let path = temp_path();
        fs::create_dir_all(&path).await?;

        let store = InMemoryStrategy::with_path(&path);
        assert!(matches!(store.connect().await, Err(StorageError::Io(_))));
        assert!(matches!(store.disconnect().await, Err(StorageError::Io(_))));

        cleanup(&path).await;
        Ok(())
    }
}
