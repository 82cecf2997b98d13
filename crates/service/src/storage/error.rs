use models::ModelName;
use thiserror::Error;

/// Failures raised by a storage backend.
///
/// A missing record is never an error: lookups return `None` and deletes
/// return `false`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("storage is not connected")]
    NotConnected,
    #[error("model {0} is not registered")]
    UnregisteredModel(ModelName),
    #[error("no ids left for model {0}")]
    IdExhausted(ModelName),
    #[error("no table backs model {0}")]
    UnknownTable(ModelName),
}
