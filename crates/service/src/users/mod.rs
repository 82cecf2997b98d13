//! User resource: repository over the storage subsystem and the business
//! rules the HTTP layer calls into.

pub mod repository;
pub mod service;

pub use repository::{StorageUserRepository, UserRepository};
pub use service::UserService;
