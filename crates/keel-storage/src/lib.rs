//! Keel Storage Layer
//!
//! SQLite-backed persistence for the session registry.
//! Snapshot writes go through a single transaction.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
