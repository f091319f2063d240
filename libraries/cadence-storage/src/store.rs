//! `StateStore` implementations

use crate::kv;
use async_trait::async_trait;
use cadence_core::StateStore;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// State store backed by the `kv_store` table
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get(&self, key: &str) -> cadence_core::Result<Option<String>> {
        Ok(kv::get(&self.pool, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> cadence_core::Result<()> {
        Ok(kv::set(&self.pool, key, value).await?)
    }

    async fn remove(&self, key: &str) -> cadence_core::Result<()> {
        kv::remove(&self.pool, key).await?;
        Ok(())
    }
}

/// Process-local state store; contents vanish on exit
#[derive(Default)]
pub struct MemoryStateStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> cadence_core::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> cadence_core::Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> cadence_core::Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty().await);

        store.set("player:snapshot", "{}").await.unwrap();
        store.set("player:snapshot", r#"{"version":1}"#).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("player:snapshot").await.unwrap().as_deref(),
            Some(r#"{"version":1}"#)
        );

        store.remove("player:snapshot").await.unwrap();
        store.remove("player:snapshot").await.unwrap();
        assert!(store.get("player:snapshot").await.unwrap().is_none());
    }
}
