use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Read-only notice shown in the client's announcement panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_kind() -> String {
    "info".to_string()
}

/// The fixed announcements served in local mode.
pub fn synthetic_announcements() -> Vec<Announcement> {
    let created_at = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    vec![
        Announcement {
            id: "local-mode".to_string(),
            title: "Local mode".to_string(),
            content: "Folders, prompts, chains and pins are stored on this machine only.".to_string(),
            kind: default_kind(),
            created_at,
            extra: Map::new(),
        },
        Announcement {
            id: "all-features".to_string(),
            title: "All features enabled".to_string(),
            content: "Every feature is available without an account.".to_string(),
            kind: default_kind(),
            created_at,
            extra: Map::new(),
        },
    ]
}
