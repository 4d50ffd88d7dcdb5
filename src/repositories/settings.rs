use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::store::{StoreAdapter, StoreKey};

/// Free-form client settings kept as one JSON object.
pub struct SettingsRepository {
    store: StoreAdapter,
    write_lock: Mutex<()>,
}

impl SettingsRepository {
    pub fn new(store: StoreAdapter) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn get(&self) -> Map<String, Value> {
        self.store.get_or_default(StoreKey::Settings).await
    }

    /// Shallow merge; a `null` value removes the setting. Clearing the last
    /// setting drops the stored key.
    pub async fn update(&self, partial: Map<String, Value>) -> Map<String, Value> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.get().await;
        for (key, value) in partial {
            if value.is_null() {
                settings.remove(&key);
            } else {
                settings.insert(key, value);
            }
        }
        if settings.is_empty() {
            self.store.remove(StoreKey::Settings).await;
        } else {
            self.store.set(StoreKey::Settings, &settings).await;
        }
        settings
    }
}
