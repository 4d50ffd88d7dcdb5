use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Entity, lenient};
use crate::store::StoreKey;

pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

/// A user-created folder for grouping conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    /// Client fields this backend does not interpret, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_name() -> String {
    DEFAULT_FOLDER_NAME.to_string()
}

impl Entity for Folder {
    const KEY: StoreKey = StoreKey::Folders;
    const KIND: &'static str = "folder";

    fn id(&self) -> &str {
        &self.id
    }

    fn defaults() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), json!(DEFAULT_FOLDER_NAME));
        map.insert("isPinned".into(), json!(false));
        map
    }
}
