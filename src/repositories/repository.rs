use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::BackendError;
use crate::models::Entity;

/// CRUD over one flat collection of `T`.
#[async_trait]
pub trait EntityRepository<T: Entity>: Send + Sync {
    async fn list(&self) -> Vec<T>;
    async fn get(&self, id: &str) -> Option<T>;
    async fn create(&self, partial: Map<String, Value>) -> Result<T, BackendError>;
    async fn update(&self, id: &str, partial: Map<String, Value>) -> Result<T, BackendError>;
    /// Idempotent; returns whether a record was removed.
    async fn delete(&self, id: &str) -> bool;
}
