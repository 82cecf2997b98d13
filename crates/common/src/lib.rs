//! Shared plumbing for the user API crates: logging setup, runtime checks
//! and small wire types.

pub mod types;
pub mod utils;
pub mod env;
