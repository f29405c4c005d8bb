//! `SQLite` implementation of [`AutomationStore`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use dobby_app::ports::AutomationStore;
use dobby_domain::automation::{Action, Automation, Condition, Trigger};
use dobby_domain::error::DobbyError;
use dobby_domain::id::AutomationId;

use crate::error::StorageError;

struct Wrapper(Automation);

fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let enabled: bool = row.try_get("enabled")?;
        let triggers_json: String = row.try_get("triggers")?;
        let conditions_json: String = row.try_get("conditions")?;
        let actions_json: String = row.try_get("actions")?;

        let id = AutomationId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let triggers: Vec<Trigger> = decode_json(&triggers_json)?;
        let conditions: Vec<Condition> = decode_json(&conditions_json)?;
        let actions: Vec<Action> = decode_json(&actions_json)?;

        Ok(Self(Automation {
            id,
            name,
            enabled,
            triggers,
            conditions,
            actions,
        }))
    }
}

/// `SQLite`-backed automation store.
///
/// The whole collection is rewritten on every save, inside one transaction,
/// so readers never observe a half-written list.
#[derive(Clone)]
pub struct SqliteAutomationStore {
    pool: SqlitePool,
}

impl SqliteAutomationStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AutomationStore for SqliteAutomationStore {
    async fn load(&self) -> Result<Vec<Automation>, DobbyError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM automations ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn save(&self, automations: &[Automation]) -> Result<(), DobbyError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query("DELETE FROM automations")
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        for (position, automation) in automations.iter().enumerate() {
            let triggers_json =
                serde_json::to_string(&automation.triggers).map_err(StorageError::from)?;
            let conditions_json =
                serde_json::to_string(&automation.conditions).map_err(StorageError::from)?;
            let actions_json =
                serde_json::to_string(&automation.actions).map_err(StorageError::from)?;

            sqlx::query(
                "INSERT INTO automations (id, position, name, enabled, triggers, conditions, actions) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(automation.id.to_string())
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .bind(&automation.name)
            .bind(automation.enabled)
            .bind(&triggers_json)
            .bind(&conditions_json)
            .bind(&actions_json)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        }

        tx.commit().await.map_err(StorageError::from)?;
        tracing::debug!(count = automations.len(), "automations saved");
        Ok(())
    }
}
