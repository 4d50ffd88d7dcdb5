use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Entity, lenient};
use crate::store::StoreKey;

pub const DEFAULT_PROMPT_NAME: &str = "New Prompt";
pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
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

fn default_name() -> String {
    DEFAULT_PROMPT_NAME.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Entity for Prompt {
    const KEY: StoreKey = StoreKey::Prompts;
    const KIND: &'static str = "prompt";

    fn id(&self) -> &str {
        &self.id
    }

    fn defaults() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), json!(DEFAULT_PROMPT_NAME));
        map.insert("category".into(), json!(DEFAULT_CATEGORY));
        map
    }

    /// Clients send either `name` or `title`. A `title` stands in for `name`
    /// only when the same call did not send a `name`.
    fn prepare(partial: &mut Map<String, Value>) {
        if partial.contains_key("name") {
            return;
        }
        let title = partial
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        if let Some(title) = title {
            partial.insert("name".into(), Value::String(title));
        }
    }

    fn normalize(&mut self) {
        if self.category.is_empty() {
            self.category = default_category();
        }
    }
}

/// Starter prompts shown at the top of the prompt library.
pub fn library_prompts() -> Vec<Prompt> {
    let created_at = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    let starter = |id: &str, name: &str, content: &str, category: &str| Prompt {
        id: id.to_string(),
        name: name.to_string(),
        title: Some(name.to_string()),
        content: content.to_string(),
        category: category.to_string(),
        created_at,
        updated_at: None,
        extra: {
            let mut extra = Map::new();
            extra.insert("builtIn".into(), json!(true));
            extra
        },
    };

    vec![
        starter(
            "library-summarize",
            "Summarize",
            "Summarize the following text in a few concise bullet points:\n\n{{text}}",
            "writing",
        ),
        starter(
            "library-explain-code",
            "Explain Code",
            "Explain what the following code does, step by step:\n\n{{code}}",
            "coding",
        ),
        starter(
            "library-translate",
            "Translate",
            "Translate the following text into {{language}}:\n\n{{text}}",
            "language",
        ),
        starter(
            "library-proofread",
            "Proofread",
            "Fix grammar and spelling in the following text without changing its meaning:\n\n{{text}}",
            "writing",
        ),
        starter(
            "library-brainstorm",
            "Brainstorm",
            "Give me ten varied ideas about {{topic}}.",
            DEFAULT_CATEGORY,
        ),
    ]
}
