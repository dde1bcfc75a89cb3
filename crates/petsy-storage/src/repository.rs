//! # Key-Value Repository
//!
//! SQLite implementation of [`KeyValueStorage`] over the `kv_store` table.
//!
//! ## Query Strategy
//! Runtime-checked `sqlx::query` calls; each statement touches one row by
//! primary key. `set` is an upsert so a key always holds exactly one value.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StorageResult;
use crate::traits::KeyValueStorage;

/// Repository for `kv_store` rows.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Lists stored keys in order, for diagnostics.
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let keys = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}

#[async_trait]
impl KeyValueStorage for KvRepository {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(key, bytes = value.len(), "kv upsert");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
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
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        debug!(key, "kv delete");

        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> KvRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().kv()
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let kv = repo().await;
        assert_eq!(kv.get(keys::AUTH_TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let kv = repo().await;

        kv.set(keys::LANGUAGE, "en").await.unwrap();
        kv.set(keys::LANGUAGE, "ar").await.unwrap();

        assert_eq!(kv.get(keys::LANGUAGE).await.unwrap().as_deref(), Some("ar"));
        assert_eq!(kv.keys().await.unwrap(), vec!["language".to_string()]);
    }

    #[tokio::test]
    async fn test_remove() {
        let kv = repo().await;

        kv.set(keys::AUTH_TOKEN, "tok").await.unwrap();
        kv.remove(keys::AUTH_TOKEN).await.unwrap();
        kv.remove(keys::AUTH_TOKEN).await.unwrap();

        assert_eq!(kv.get(keys::AUTH_TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("petsy.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.kv().set(keys::CART, r#"[{"product_id":"p1"}]"#).await.unwrap();
        db.kv().set(keys::LANGUAGE, "ar").await.unwrap();
        db.close().await;

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let kv = db.kv();
        assert_eq!(kv.get(keys::LANGUAGE).await.unwrap().as_deref(), Some("ar"));
        assert_eq!(
            kv.get(keys::CART).await.unwrap().as_deref(),
            Some(r#"[{"product_id":"p1"}]"#)
        );
    }

    #[tokio::test]
    async fn test_closed_pool_surfaces_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();
        db.close().await;

        assert!(kv.set(keys::LANGUAGE, "ar").await.is_err());
    }
}
