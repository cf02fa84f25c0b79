//! SQLite Key-Value Store

use async_trait::async_trait;
use chrono::Utc;

use super::DbPool;
use crate::application::ports::{KeyValueStorePort, KvError};

/// SQLite KV 存储（单表 `kv_entries`）
pub struct SqliteKeyValueStore {
    pool: DbPool,
}

impl SqliteKeyValueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStorePort for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        sqlx::query_scalar::<_, Vec<u8>>("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| KvError::DatabaseError(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| KvError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, KvError> {
        sqlx::query_scalar::<_, String>("SELECT key FROM kv_entries")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| KvError::DatabaseError(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| KvError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn store() -> SqliteKeyValueStore {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteKeyValueStore::new(pool)
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let store = store().await;

        store.set("k", vec![1, 2]).await.unwrap();
        store.set("k", vec![3]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![3]));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let store = store().await;

        store.set("a", vec![1]).await.unwrap();
        store.set("b", vec![2]).await.unwrap();
        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["b"]);
    }
}
