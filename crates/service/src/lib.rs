//! Service layer: the storage subsystem and the user domain built on it.
//! - `storage` hides which backend (file-backed memory or database) is active.
//! - `users` holds the repository and business rules for the user resource.

pub mod errors;
pub mod storage;
pub mod users;
