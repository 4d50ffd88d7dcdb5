use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Entity, lenient};
use crate::store::StoreKey;

/// An ordered sequence of prompts run one after another.
///
/// `prompts` holds whatever the client sent (ids or inline prompt objects);
/// nothing checks that referenced prompts still exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub prompts: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const DEFAULT_CHAIN_NAME: &str = "New Chain";

fn default_name() -> String {
    DEFAULT_CHAIN_NAME.to_string()
}

impl Entity for Chain {
    const KEY: StoreKey = StoreKey::Chains;
    const KIND: &'static str = "chain";

    fn id(&self) -> &str {
        &self.id
    }

    fn defaults() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), json!(DEFAULT_CHAIN_NAME));
        map.insert("prompts".into(), json!([]));
        map
    }
}
