use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::{validate_key, KeyValueStore};
use crate::error::DbError;
use crate::models::KvEntryRow;

/// SQLite-backed store over the `kv_entries` table
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and migrate it
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let pool = crate::pool::create_pool(database_url).await?;
        crate::pool::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn entry(&self, key: &str) -> Result<Option<KvEntryRow>, DbError> {
        let row: Option<KvEntryRow> = sqlx::query_as(
            r#"
            SELECT key, value, updated_at
            FROM kv_entries
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Escape LIKE wildcards so a prefix matches literally
fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self.entry(key).await?.map(|row| row.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        validate_key(key)?;
        let row = KvEntryRow::new(key, value);

        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&row.key)
        .bind(&row.value)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "Stored entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, DbError> {
        let keys: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT key
            FROM kv_entries
            WHERE key LIKE ? ESCAPE '\'
            ORDER BY key
            "#,
        )
        .bind(like_prefix_pattern(prefix))
        .fetch_all(&self.pool)
        .await?;

        // LIKE is case-insensitive for ASCII in SQLite
        Ok(keys
            .into_iter()
            .map(|(key,)| key)
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}", temp_dir.path().join("test.db").display());
        let store = SqliteStore::connect(&url).await.unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_like_prefix_pattern() {
        assert_eq!(like_prefix_pattern("project-"), "project-%");
        assert_eq!(like_prefix_pattern("a_b%"), "a\\_b\\%%");
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (store, _temp) = create_test_store().await;

        store.set("project-1", r#"{"id":"1"}"#).await.unwrap();
        let value = store.get("project-1").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"id":"1"}"#));

        let entry = store.entry("project-1").await.unwrap().unwrap();
        assert!(entry.updated_at > 0);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (store, _temp) = create_test_store().await;

        store.set("planwise-credential", "old").await.unwrap();
        store.set("planwise-credential", "new").await.unwrap();

        assert_eq!(
            store.get("planwise-credential").await.unwrap().as_deref(),
            Some("new")
        );
        assert_eq!(store.list_keys("").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp) = create_test_store().await;

        store.set("project-1", "{}").await.unwrap();
        assert!(store.delete("project-1").await.unwrap());
        assert!(!store.delete("project-1").await.unwrap());
        assert!(store.get("project-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keys_matches_prefix_literally() {
        let (store, _temp) = create_test_store().await;

        store.set("project-2", "{}").await.unwrap();
        store.set("project-1", "{}").await.unwrap();
        store.set("Project-3", "{}").await.unwrap();
        store.set("projectX1", "{}").await.unwrap();
        store.set("planwise-credential", "key").await.unwrap();

        let keys = store.list_keys("project-").await.unwrap();
        assert_eq!(keys, vec!["project-1".to_string(), "project-2".to_string()]);
    }
}
