pub mod file_store;
pub mod memory_store;
pub mod sqlite_store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Top-level keys of the persisted layout, one per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Folders,
    Prompts,
    Chains,
    Pinned,
    Announcements,
    UserData,
    Settings,
}

impl StoreKey {
    pub const ALL: [StoreKey; 7] = [
        StoreKey::Folders,
        StoreKey::Prompts,
        StoreKey::Chains,
        StoreKey::Pinned,
        StoreKey::Announcements,
        StoreKey::UserData,
        StoreKey::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Folders => "local_folders",
            StoreKey::Prompts => "local_prompts",
            StoreKey::Chains => "local_chains",
            StoreKey::Pinned => "local_pinned",
            StoreKey::Announcements => "local_announcements",
            StoreKey::UserData => "local_user_data",
            StoreKey::Settings => "local_settings",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespaced, asynchronous key-value substrate holding JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set_raw(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Keys end up in file names and SQL parameters; keep them boring.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Typed view over a [`KeyValueStore`] that never fails.
///
/// Reads fall back to the caller's default when the substrate errors or the
/// stored value has the wrong shape. Write failures are logged and reported
/// as a `false` acknowledgement instead of an error.
#[derive(Clone)]
pub struct StoreAdapter {
    inner: Arc<dyn KeyValueStore>,
}

impl StoreAdapter {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: StoreKey, default: T) -> T {
        match self.inner.get_raw(key.as_str()).await {
            Ok(Some(value)) => match serde_json::from_value::<T>(value) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "stored value has unexpected shape, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "store read failed, using default");
                default
            }
        }
    }

    pub async fn get_or_default<T: DeserializeOwned + Default>(&self, key: StoreKey) -> T {
        self.get(key, T::default()).await
    }

    /// Returns whether the value was persisted.
    pub async fn set<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "failed to serialize value for store");
                return false;
            }
        };
        match self.inner.set_raw(key.as_str(), value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "store write failed, change kept in memory only");
                false
            }
        }
    }

    /// Drops the key entirely. Returns whether the backend accepted the
    /// removal; a key that was never written counts as removed.
    pub async fn remove(&self, key: StoreKey) -> bool {
        match self.inner.remove(key.as_str()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "store remove failed");
                false
            }
        }
    }

    /// Every known collection as raw JSON, plus any other keys the backend
    /// holds, for export.
    pub async fn snapshot(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for key in StoreKey::ALL {
            let value = self.get(key, Value::Null).await;
            out.insert(key.as_str().to_string(), value);
        }
        match self.inner.keys().await {
            Ok(keys) => {
                for key in keys {
                    if out.contains_key(&key) {
                        continue;
                    }
                    if let Ok(Some(value)) = self.inner.get_raw(&key).await {
                        out.insert(key, value);
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not list store keys"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::memory_store::MemoryKeyValueStore;
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
    struct Sample {
        name: String,
    }

    #[test]
    fn key_names_match_persisted_layout() {
        let names: Vec<&str> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "local_folders",
                "local_prompts",
                "local_chains",
                "local_pinned",
                "local_announcements",
                "local_user_data",
                "local_settings",
            ]
        );
    }

    #[test]
    fn validate_key_rejects_path_tricks() {
        assert!(validate_key("local_folders").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("a b").is_err());
    }

    #[tokio::test]
    async fn get_returns_default_when_absent() {
        let store = StoreAdapter::new(Arc::new(MemoryKeyValueStore::new()));
        let folders: Vec<Sample> = store.get_or_default(StoreKey::Folders).await;
        assert!(folders.is_empty());
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = StoreAdapter::new(Arc::new(MemoryKeyValueStore::new()));
        let ack = store
            .set(StoreKey::Settings, &Sample { name: "x".into() })
            .await;
        assert!(ack);
        let loaded: Sample = store.get_or_default(StoreKey::Settings).await;
        assert_eq!(loaded.name, "x");
    }

    #[tokio::test]
    async fn unavailable_store_is_absorbed() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let store = StoreAdapter::new(backend.clone());
        assert!(store.set(StoreKey::Settings, &Sample { name: "kept".into() }).await);

        backend.set_available(false);
        let ack = store.set(StoreKey::Settings, &Sample { name: "lost".into() }).await;
        assert!(!ack);
        let fallback = store
            .get(StoreKey::Settings, Sample { name: "fallback".into() })
            .await;
        assert_eq!(fallback.name, "fallback");

        backend.set_available(true);
        let loaded: Sample = store.get_or_default(StoreKey::Settings).await;
        assert_eq!(loaded.name, "kept");
    }

    #[tokio::test]
    async fn wrong_shape_falls_back_to_default() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set_raw("local_folders", serde_json::json!({"not": "a list"}))
            .await
            .unwrap();
        let store = StoreAdapter::new(backend);
        let folders: Vec<Sample> = store.get_or_default(StoreKey::Folders).await;
        assert!(folders.is_empty());
    }

    #[tokio::test]
    async fn snapshot_lists_every_key() {
        let store = StoreAdapter::new(Arc::new(MemoryKeyValueStore::new()));
        store.set(StoreKey::Folders, &vec![Sample { name: "a".into() }]).await;
        let snap = store.snapshot().await;
        assert_eq!(snap.len(), StoreKey::ALL.len());
        assert_eq!(snap["local_folders"][0]["name"], "a");
        assert!(snap["local_prompts"].is_null());
    }

    #[tokio::test]
    async fn snapshot_includes_unknown_keys() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set_raw("legacy_export", serde_json::json!({"v": 1}))
            .await
            .unwrap();
        let snap = StoreAdapter::new(backend).snapshot().await;
        assert_eq!(snap.len(), StoreKey::ALL.len() + 1);
        assert_eq!(snap["legacy_export"]["v"], 1);
    }
}
