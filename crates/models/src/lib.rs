//! Entities and model identifiers shared by the storage backends.

pub mod errors;
pub mod db;
pub mod model_name;
pub mod user;

pub use model_name::ModelName;
