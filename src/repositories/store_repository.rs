use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::ids::IdGenerator;
use super::repository::EntityRepository;
use crate::error::BackendError;
use crate::models::Entity;
use crate::store::StoreAdapter;

/// Keeps the whole collection under `T::KEY` and rewrites it on every
/// mutation. Mutations are serialized per collection so concurrent writers
/// cannot lose each other's changes.
///
/// Mutations work on the raw stored entries, so an entry that does not parse
/// as `T` is hidden from reads but written back untouched.
pub struct StoreRepository<T: Entity> {
    store: StoreAdapter,
    ids: Arc<IdGenerator>,
    write_lock: Mutex<()>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> StoreRepository<T> {
    pub fn new(store: StoreAdapter, ids: Arc<IdGenerator>) -> Self {
        Self {
            store,
            ids,
            write_lock: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    async fn load_raw(&self) -> Vec<Value> {
        self.store.get_or_default(T::KEY).await
    }

    async fn load(&self) -> Vec<T> {
        self.load_raw()
            .await
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<T>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(key = %T::KEY, error = %e, "Skipping invalid stored record");
                    None
                }
            })
            .collect()
    }

    async fn persist(&self, entries: &[Value]) {
        if !self.store.set(T::KEY, entries).await {
            tracing::warn!(key = %T::KEY, count = entries.len(), "collection not persisted");
        }
    }

    fn encode(record: &T) -> Result<Value, BackendError> {
        serde_json::to_value(record).map_err(|e| BackendError::InvalidRecord {
            entity: T::KIND,
            reason: e.to_string(),
        })
    }
}

/// The `id` of a raw stored entry, string or numeric.
fn stored_id(entry: &Value) -> Option<String> {
    match entry.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn has_id(entry: &Value, id: &str) -> bool {
    stored_id(entry).is_some_and(|stored| stored == id)
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for StoreRepository<T> {
    async fn list(&self) -> Vec<T> {
        self.load().await
    }

    async fn get(&self, id: &str) -> Option<T> {
        self.load().await.into_iter().find(|r| r.id() == id)
    }

    async fn create(&self, partial: Map<String, Value>) -> Result<T, BackendError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_raw().await;

        let id = self
            .ids
            .next_unused(|candidate| entries.iter().any(|e| has_id(e, candidate)));
        let record = T::from_partial(&id, Utc::now(), partial)?;

        entries.push(Self::encode(&record)?);
        self.persist(&entries).await;
        tracing::debug!(kind = T::KIND, id = %id, "created record");
        Ok(record)
    }

    async fn update(&self, id: &str, partial: Map<String, Value>) -> Result<T, BackendError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_raw().await;

        let slot = entries
            .iter_mut()
            .find(|e| has_id(e, id))
            .ok_or_else(|| BackendError::NotFound {
                entity: T::KIND,
                id: id.to_string(),
            })?;
        let current: T = serde_json::from_value(slot.clone()).map_err(|e| BackendError::InvalidRecord {
            entity: T::KIND,
            reason: e.to_string(),
        })?;
        let merged = current.merged(Utc::now(), partial)?;
        *slot = Self::encode(&merged)?;

        self.persist(&entries).await;
        tracing::debug!(kind = T::KIND, id = %id, "updated record");
        Ok(merged)
    }

    async fn delete(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_raw().await;
        let before = entries.len();
        entries.retain(|e| !has_id(e, id));
        let removed = entries.len() != before;

        if removed {
            self.persist(&entries).await;
            tracing::debug!(kind = T::KIND, id = %id, "deleted record");
        }
        removed
    }
}
