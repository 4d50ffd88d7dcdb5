use crate::models::UserData;
use crate::store::{StoreAdapter, StoreKey};

/// The singleton user record. Whatever is stored, reads always come back
/// fully entitled.
pub struct UserDataRepository {
    store: StoreAdapter,
}

impl UserDataRepository {
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// Materialize the entitled record in the store.
    pub async fn initialize(&self) -> UserData {
        let user = self.get().await;
        if !self.store.set(StoreKey::UserData, &user).await {
            tracing::warn!("user data not persisted, serving in-memory entitlement");
        }
        user
    }

    pub async fn get(&self) -> UserData {
        let stored: UserData = self
            .store
            .get(StoreKey::UserData, UserData::entitled())
            .await;
        stored.into_entitled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;
    use crate::store::memory_store::MemoryKeyValueStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn initialize_writes_entitled_record() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let repo = UserDataRepository::new(StoreAdapter::new(backend.clone()));
        let user = repo.initialize().await;
        assert!(user.is_entitled());

        let raw = backend.get_raw("local_user_data").await.unwrap().unwrap();
        assert_eq!(raw["isPremium"], true);
        assert_eq!(raw["isPaid"], true);
        assert_eq!(raw["subscriptionStatus"], "active");
    }

    #[tokio::test]
    async fn stored_downgrade_is_ignored() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set_raw(
                "local_user_data",
                json!({"isPremium": false, "isPaid": false, "subscriptionStatus": "expired"}),
            )
            .await
            .unwrap();
        let repo = UserDataRepository::new(StoreAdapter::new(backend));
        assert!(repo.get().await.is_entitled());
    }
}
