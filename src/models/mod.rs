pub mod announcement;
pub mod chain;
pub mod folder;
pub mod lenient;
pub mod pinned;
pub mod prompt;
pub mod user;

pub use announcement::Announcement;
pub use chain::Chain;
pub use folder::Folder;
pub use pinned::PinnedItem;
pub use prompt::Prompt;
pub use user::{Entitlement, UserData};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::BackendError;
use crate::store::StoreKey;

/// A record kept in one flat, id-keyed collection of the store.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Store key holding the whole collection.
    const KEY: StoreKey;
    /// Singular name used in routes and error messages.
    const KIND: &'static str;
    /// Field stamped with the creation time.
    const CREATED_FIELD: &'static str = "createdAt";
    /// Field stamped on every update, if the entity has one.
    const UPDATED_FIELD: Option<&'static str> = Some("updatedAt");

    fn id(&self) -> &str;

    /// Generated defaults that caller-supplied fields are merged over.
    fn defaults() -> Map<String, Value> {
        Map::new()
    }

    /// Rewrites the caller's fields before they are merged, e.g. filling
    /// one field from an alias the caller sent instead.
    fn prepare(_partial: &mut Map<String, Value>) {}

    /// Fix-ups after a merge.
    fn normalize(&mut self) {}

    /// Build a fresh record: defaults, then the caller's fields, then the
    /// generated id and timestamps (which the caller cannot override).
    fn from_partial(id: &str, now: DateTime<Utc>, mut partial: Map<String, Value>) -> Result<Self, BackendError> {
        Self::prepare(&mut partial);
        let mut fields = Self::defaults();
        overlay(&mut fields, partial, Self::protected_fields());
        fields.insert("id".into(), Value::String(id.to_string()));
        fields.insert(Self::CREATED_FIELD.into(), timestamp(now));
        if let Some(updated) = Self::UPDATED_FIELD {
            fields.insert(updated.into(), timestamp(now));
        }
        Self::from_fields(fields)
    }

    /// Shallow merge: fields in `partial` overwrite, absent fields are kept.
    fn merged(&self, now: DateTime<Utc>, mut partial: Map<String, Value>) -> Result<Self, BackendError> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                return Err(BackendError::InvalidRecord {
                    entity: Self::KIND,
                    reason: e.to_string(),
                });
            }
        };
        Self::prepare(&mut partial);
        overlay(&mut fields, partial, Self::protected_fields());
        if let Some(updated) = Self::UPDATED_FIELD {
            fields.insert(updated.into(), timestamp(now));
        }
        Self::from_fields(fields)
    }

    fn protected_fields() -> [&'static str; 3] {
        ["id", Self::CREATED_FIELD, Self::UPDATED_FIELD.unwrap_or("id")]
    }

    fn from_fields(fields: Map<String, Value>) -> Result<Self, BackendError> {
        let mut record: Self =
            serde_json::from_value(Value::Object(fields)).map_err(|e| BackendError::InvalidRecord {
                entity: Self::KIND,
                reason: e.to_string(),
            })?;
        record.normalize();
        Ok(record)
    }
}

fn overlay(target: &mut Map<String, Value>, partial: Map<String, Value>, protected: [&str; 3]) {
    for (key, value) in partial {
        if protected.contains(&key.as_str()) {
            continue;
        }
        target.insert(key, value);
    }
}

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn from_partial_applies_defaults_and_generated_fields() {
        let now = Utc::now();
        let folder = Folder::from_partial("42", now, obj(json!({"description": "stuff"}))).unwrap();
        assert_eq!(folder.id, "42");
        assert_eq!(folder.name, "New Folder");
        assert_eq!(folder.description.as_deref(), Some("stuff"));
        assert!(!folder.is_pinned);
        assert_eq!(folder.created_at.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn from_partial_ignores_caller_id_and_created_at() {
        let now = Utc::now();
        let folder = Folder::from_partial(
            "generated",
            now,
            obj(json!({"id": "mine", "createdAt": "2001-01-01T00:00:00Z", "name": "Work"})),
        )
        .unwrap();
        assert_eq!(folder.id, "generated");
        assert_eq!(folder.name, "Work");
        assert_eq!(folder.created_at.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn merged_keeps_untouched_and_unknown_fields() {
        let now = Utc::now();
        let folder = Folder::from_partial(
            "1",
            now,
            obj(json!({"name": "Work", "description": "d", "color": "#ff0000"})),
        )
        .unwrap();
        let later = now + chrono::Duration::seconds(5);
        let updated = folder.merged(later, obj(json!({"name": "Work2", "id": "hijack"}))).unwrap();

        assert_eq!(updated.id, "1");
        assert_eq!(updated.name, "Work2");
        assert_eq!(updated.description.as_deref(), Some("d"));
        assert_eq!(updated.extra.get("color"), Some(&json!("#ff0000")));
        assert_eq!(updated.created_at, folder.created_at);
        assert_eq!(
            updated.updated_at.map(|t| t.timestamp_millis()),
            Some(later.timestamp_millis())
        );
    }

    #[test]
    fn wrong_field_type_is_invalid_record() {
        let err = Folder::from_partial("1", Utc::now(), obj(json!({"name": 7}))).unwrap_err();
        assert!(matches!(err, BackendError::InvalidRecord { entity: "folder", .. }));
    }
}
