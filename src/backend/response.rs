use hyper::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BackendError;
use crate::models::{Announcement, Chain, Entitlement, Folder, PinnedItem, Prompt, UserData};

/// The `data` of a backend envelope, one variant per shape the routes return.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Folders(Vec<Folder>),
    Folder(Folder),
    Prompts(Vec<Prompt>),
    Prompt(Prompt),
    Chains(Vec<Chain>),
    Chain(Chain),
    PinnedItems(Vec<PinnedItem>),
    PinnedItem(PinnedItem),
    Announcements(Vec<Announcement>),
    User(UserData),
    Settings(Map<String, Value>),
    Deleted(Deleted),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

/// `{success: true, data}` or `{success: false, error}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Ok { success: bool, data: Option<Payload> },
    Err { success: bool, error: String },
}

impl Envelope {
    pub fn ok(data: Option<Payload>) -> Self {
        Envelope::Ok { success: true, data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Err {
            success: false,
            error: message.into(),
        }
    }
}

/// Body of `auth/generate-jwt`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub success: bool,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Body of `auth/jwks`. Always empty: local tokens are never verified remotely.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Jwks {
    pub keys: Vec<Value>,
}

/// Every body the router can produce. Auth and payment endpoints keep the
/// remote API's own shapes; everything else uses the envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Envelope(Envelope),
    Token(AuthToken),
    Jwks(Jwks),
    Entitlement(Entitlement),
}

#[derive(Debug, Clone)]
pub struct RouteResult {
    pub status: StatusCode,
    pub body: ApiResponse,
}

impl RouteResult {
    pub fn ok(body: ApiResponse) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn data(payload: Payload) -> Self {
        Self::ok(ApiResponse::Envelope(Envelope::ok(Some(payload))))
    }

    /// Generic success for routes nothing is mapped to.
    pub fn empty() -> Self {
        Self::ok(ApiResponse::Envelope(Envelope::ok(None)))
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiResponse::Envelope(Envelope::error(message)),
        }
    }
}

impl From<BackendError> for RouteResult {
    fn from(err: BackendError) -> Self {
        RouteResult::failure(err.status(), err.to_string())
    }
}

impl From<Result<Payload, BackendError>> for RouteResult {
    fn from(result: Result<Payload, BackendError>) -> Self {
        match result {
            Ok(payload) => RouteResult::data(payload),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_envelope_has_null_data() {
        let result = RouteResult::empty();
        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(
            serde_json::to_value(&result.body).unwrap(),
            json!({"success": true, "data": null})
        );
    }

    #[test]
    fn error_envelope_shape() {
        let result: RouteResult = BackendError::MissingId("folder").into();
        assert_eq!(result.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(&result.body).unwrap(),
            json!({"success": false, "error": "missing id for folder"})
        );
    }

    #[test]
    fn deleted_payload_shape() {
        let result = RouteResult::data(Payload::Deleted(Deleted {
            id: "1".into(),
            deleted: false,
        }));
        assert_eq!(
            serde_json::to_value(&result.body).unwrap(),
            json!({"success": true, "data": {"id": "1", "deleted": false}})
        );
    }
}
