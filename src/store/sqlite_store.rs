use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::{KeyValueStore, StoreError, validate_key};

/// Key-value rows in a single SQLite table, partitioned by namespace.
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
    namespace: String,
}

impl SqliteKeyValueStore {
    pub fn open(path: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, namespace)
    }

    #[cfg(test)]
    pub fn open_in_memory(namespace: &str) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, namespace)
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
            [],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            namespace: namespace.to_string(),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let namespace = self.namespace.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".into()))?;
            f(&*guard, &namespace)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("sqlite task failed: {e}")))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let key = key.to_string();
        let raw: Option<String> = self
            .with_conn(move |conn, ns| {
                Ok(conn
                    .query_row(
                        "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
                        params![ns, key],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: Value) -> Result<(), StoreError> {
        validate_key(key)?;
        let key = key.to_string();
        let text = serde_json::to_string(&value)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(move |conn, ns| {
            conn.execute(
                "INSERT INTO kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![ns, key, text, now],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        let key = key.to_string();
        self.with_conn(move |conn, ns| {
            let n = conn.execute(
                "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
                params![ns, key],
            )?;
            Ok(n > 0)
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn, ns| {
            let mut stmt = conn.prepare("SELECT key FROM kv WHERE namespace = ?1 ORDER BY key")?;
            let rows = stmt.query_map(params![ns], |row| row.get::<_, String>(0))?;
            let mut keys = Vec::new();
            for row in rows {
                keys.push(row?);
            }
            Ok(keys)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        let store = SqliteKeyValueStore::open_in_memory("default").unwrap();
        assert!(store.get_raw("local_prompts").await.unwrap().is_none());

        store.set_raw("local_prompts", json!([{"id": "1"}])).await.unwrap();
        store.set_raw("local_prompts", json!([{"id": "2"}])).await.unwrap();

        let loaded = store.get_raw("local_prompts").await.unwrap().unwrap();
        assert_eq!(loaded, json!([{"id": "2"}]));
        assert_eq!(store.keys().await.unwrap(), vec!["local_prompts"]);

        assert!(store.remove("local_prompts").await.unwrap());
        assert!(!store.remove("local_prompts").await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_connections() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("store.db");
        {
            let store = SqliteKeyValueStore::open(&path, "default").unwrap();
            store.set_raw("local_user_data", json!({"isPremium": true})).await.unwrap();
        }
        let store = SqliteKeyValueStore::open(&path, "default").unwrap();
        let loaded = store.get_raw("local_user_data").await.unwrap().unwrap();
        assert_eq!(loaded["isPremium"], true);

        let other = SqliteKeyValueStore::open(&path, "other").unwrap();
        assert!(other.get_raw("local_user_data").await.unwrap().is_none());
    }
}
