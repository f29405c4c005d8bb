//! # dobby-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `AutomationStore` port defined in `dobby-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `dobby-app` (for port traits) and `dobby-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod automation_store;
mod error;
mod pool;

pub use automation_store::SqliteAutomationStore;
pub use error::StorageError;
pub use pool::{Config, Database};
