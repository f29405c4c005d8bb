//! Opening the automation database.
//!
//! A [`Config`] names the `SQLite` file; [`Database`] owns the pool once the
//! `automations` table has been migrated and hands out
//! [`SqliteAutomationStore`] handles sharing that pool.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::automation_store::SqliteAutomationStore;
use crate::error::StorageError;

/// Where the automation rules are persisted.
pub struct Config {
    /// `SQLite` connection URL, e.g. `sqlite:dobby.db?mode=rwc`, or
    /// `sqlite::memory:` for a database that lives as long as the process.
    pub database_url: String,
}

impl Config {
    /// Open the database, creating the file when missing, and migrate the
    /// `automations` table.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid, the file cannot be
    /// opened, or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::open(&self.database_url).await
    }
}

/// `true` when `url` names a private in-memory database.
fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// A migrated automation database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn open(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` gets its own empty database, so the
        // pool must keep exactly one alive for the rules to survive.
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(url = database_url, "automation database ready");

        Ok(Self { pool })
    }

    /// A store reading and writing the rules of this database.
    #[must_use]
    pub fn automation_store(&self) -> SqliteAutomationStore {
        SqliteAutomationStore::new(self.pool.clone())
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
