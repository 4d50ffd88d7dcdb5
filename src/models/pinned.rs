use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Entity, lenient};
use crate::store::StoreKey;

/// A pinned conversation or message. The payload is opaque to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedItem {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub pinned_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Entity for PinnedItem {
    const KEY: StoreKey = StoreKey::Pinned;
    const KIND: &'static str = "pinned item";
    const CREATED_FIELD: &'static str = "pinnedAt";
    const UPDATED_FIELD: Option<&'static str> = None;

    fn id(&self) -> &str {
        &self.id
    }
}
