use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::{debug, warn};

use shared::domain::{Scene, SceneId};

pub const DEFAULT_NAMESPACE: &str = "xy-backbone";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredItem {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database is a separate database.
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    pub async fn load_item(&self, key: &str) -> Result<Option<StoredItem>> {
        let row = sqlx::query("SELECT key, value, updated_at FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| StoredItem {
            key: r.get::<String, _>(0),
            value: r.get::<String, _>(1),
            updated_at: r.get::<DateTime<Utc>, _>(2),
        }))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// SQLite `substr` counts characters, so the prefix length is bound in characters.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv_store WHERE substr(key, 1, ?) = ? ORDER BY key")
            .bind(prefix.chars().count() as i64)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }
}

/// Persistence seam for a scene collection.
#[async_trait]
pub trait SceneStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Scene>>;
    async fn find(&self, id: SceneId) -> Result<Option<Scene>>;
    async fn create(&self, scene: &Scene) -> Result<()>;
    async fn update(&self, scene: &Scene) -> Result<()>;
    async fn destroy(&self, id: SceneId) -> Result<bool>;
}

/// Namespaced record store in the shape of browser local storage: the
/// namespace key holds the comma separated list of record ids and every
/// record sits under `"{namespace}-{id}"` as JSON.
#[derive(Clone)]
pub struct LocalStorage {
    storage: Storage,
    name: String,
}

impl LocalStorage {
    pub fn new(storage: Storage, name: impl Into<String>) -> Self {
        Self {
            storage,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn record_key(&self, id: &str) -> String {
        format!("{}-{id}", self.name)
    }

    pub async fn record_ids(&self) -> Result<Vec<String>> {
        let raw = self
            .storage
            .get_item(&self.name)
            .await
            .with_context(|| format!("failed to read index for namespace '{}'", self.name))?;
        Ok(raw
            .map(|ids| {
                ids.split(',')
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_record_ids(&self, ids: &[String]) -> Result<()> {
        self.storage
            .set_item(&self.name, &ids.join(","))
            .await
            .with_context(|| format!("failed to write index for namespace '{}'", self.name))
    }

    pub async fn read_record<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        let key = self.record_key(id);
        let Some(raw) = self.storage.get_item(&key).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&raw)
            .with_context(|| format!("failed to decode record '{key}'"))?;
        Ok(Some(record))
    }

    pub async fn write_record<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        let key = self.record_key(id);
        let raw = serde_json::to_string(record)
            .with_context(|| format!("failed to encode record '{key}'"))?;
        self.storage.set_item(&key, &raw).await?;

        let mut ids = self.record_ids().await?;
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
            self.save_record_ids(&ids).await?;
        }
        Ok(())
    }

    pub async fn remove_record(&self, id: &str) -> Result<bool> {
        let removed = self.storage.remove_item(&self.record_key(id)).await?;
        let mut ids = self.record_ids().await?;
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() != before {
            self.save_record_ids(&ids).await?;
        }
        Ok(removed)
    }

    /// Raw keys owned by this namespace: the index key, then each indexed record key.
    /// Resolved through the index, since another namespace may share the `"{name}-"` prefix.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if self.storage.get_item(&self.name).await?.is_some() {
            keys.push(self.name.clone());
        }
        for id in self.record_ids().await? {
            let key = self.record_key(&id);
            if self.storage.get_item(&key).await?.is_some() {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Drops the index and every record of this namespace. Returns the number of records removed.
    pub async fn clear(&self) -> Result<usize> {
        let ids = self.record_ids().await?;
        let mut removed = 0;
        for id in &ids {
            if self.storage.remove_item(&self.record_key(id)).await? {
                removed += 1;
            }
        }
        self.storage.remove_item(&self.name).await?;
        debug!(namespace = %self.name, removed, "cleared namespace");
        Ok(removed)
    }
}

#[async_trait]
impl SceneStore for LocalStorage {
    async fn find_all(&self) -> Result<Vec<Scene>> {
        let mut scenes = Vec::new();
        for id in self.record_ids().await? {
            match self.read_record::<Scene>(&id).await? {
                Some(scene) => scenes.push(scene),
                None => warn!(namespace = %self.name, record = %id, "index points at missing record"),
            }
        }
        Ok(scenes)
    }

    async fn find(&self, id: SceneId) -> Result<Option<Scene>> {
        self.read_record(&id.to_string()).await
    }

    async fn create(&self, scene: &Scene) -> Result<()> {
        self.write_record(&scene.id.to_string(), scene)
            .await
            .with_context(|| format!("failed to create scene {}", scene.id))
    }

    async fn update(&self, scene: &Scene) -> Result<()> {
        self.write_record(&scene.id.to_string(), scene)
            .await
            .with_context(|| format!("failed to update scene {}", scene.id))
    }

    async fn destroy(&self, id: SceneId) -> Result<bool> {
        self.remove_record(&id.to_string())
            .await
            .with_context(|| format!("failed to destroy scene {id}"))
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
