use crate::models::Announcement;
use crate::models::announcement::synthetic_announcements;
use crate::store::{StoreAdapter, StoreKey};

/// Synthetic announcements merged with any stored locally. A stored
/// announcement with the same id replaces the synthetic one.
pub struct AnnouncementRepository {
    store: StoreAdapter,
}

impl AnnouncementRepository {
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Vec<Announcement> {
        let stored: Vec<Announcement> = self.store.get_or_default(StoreKey::Announcements).await;
        let mut merged: Vec<Announcement> = synthetic_announcements()
            .into_iter()
            .filter(|a| !stored.iter().any(|s| s.id == a.id))
            .collect();
        merged.extend(stored);
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        merged
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
    async fn synthetic_set_when_nothing_stored() {
        let repo = AnnouncementRepository::new(StoreAdapter::new(Arc::new(MemoryKeyValueStore::new())));
        let list = repo.list().await;
        assert_eq!(list.len(), synthetic_announcements().len());
    }

    #[tokio::test]
    async fn stored_announcements_merge_and_override() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set_raw(
                "local_announcements",
                json!([
                    {"id": "local-mode", "title": "Replaced", "createdAt": "2024-01-01T00:00:00Z"},
                    {"id": "news", "title": "News", "createdAt": "2025-06-01T00:00:00Z"}
                ]),
            )
            .await
            .unwrap();
        let repo = AnnouncementRepository::new(StoreAdapter::new(backend));
        let list = repo.list().await;

        assert_eq!(list.len(), synthetic_announcements().len() + 1);
        assert_eq!(list[0].id, "news");
        let local = list.iter().find(|a| a.id == "local-mode").unwrap();
        assert_eq!(local.title, "Replaced");
    }
}
