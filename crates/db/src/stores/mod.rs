mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

use async_trait::async_trait;

use crate::error::DbError;

/// String key-value storage with prefix enumeration.
///
/// Values are opaque strings (JSON documents in practice). Keys are non-empty.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DbError>;

    /// Insert or overwrite `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), DbError>;

    /// Remove `key`, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DbError>;

    /// All keys starting with `prefix`, sorted
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, DbError>;
}

pub(crate) fn validate_key(key: &str) -> Result<(), DbError> {
    if key.trim().is_empty() {
        return Err(DbError::InvalidKey(key.to_string()));
    }
    Ok(())
}
