use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::{PreferenceKey, PreferenceStore, StoreError, StoreResult};

/// Preference store backed by the `preferences` sqlite table.
#[derive(Debug, Clone)]
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
}

impl SqlitePreferenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get(&self, key: PreferenceKey) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        row.map(|row| {
            row.try_get::<String, _>("value")
                .map_err(|e| StoreError::DatabaseError(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, key: PreferenceKey, value: Option<String>) -> StoreResult<()> {
        let Some(value) = value else {
            sqlx::query("DELETE FROM preferences WHERE key = ?")
                .bind(key.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            debug!(%key, "preference removed");
            return Ok(());
        };

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        debug!(%key, "preference stored");
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM preferences")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
