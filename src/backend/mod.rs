pub mod account;
pub mod chains;
pub mod crud;
pub mod folders;
pub mod pinned;
pub mod prompts;
pub mod request;
pub mod response;

use std::sync::Arc;

use hyper::Method;

use crate::error::BackendError;
use crate::models::{Chain, Folder, PinnedItem, Prompt};
use crate::repositories::{
    AnnouncementRepository, EntityRepository, IdGenerator, SettingsRepository, StoreRepository,
    UserDataRepository,
};
use crate::store::StoreAdapter;

pub use account::TokenIssuer;
pub use request::RouteRequest;
pub use response::{ApiResponse, Envelope, Payload, RouteResult};

/// Serves the remote API's surface from local storage.
pub struct LocalBackend {
    pub(crate) folders: Arc<dyn EntityRepository<Folder>>,
    pub(crate) prompts: Arc<dyn EntityRepository<Prompt>>,
    pub(crate) chains: Arc<dyn EntityRepository<Chain>>,
    pub(crate) pinned: Arc<dyn EntityRepository<PinnedItem>>,
    pub(crate) announcements: AnnouncementRepository,
    pub(crate) user: UserDataRepository,
    pub(crate) settings: SettingsRepository,
    pub(crate) tokens: TokenIssuer,
    api_prefix: String,
}

impl LocalBackend {
    pub fn new(store: StoreAdapter, api_prefix: impl Into<String>) -> Self {
        let ids = Arc::new(IdGenerator::new());
        Self {
            folders: Arc::new(StoreRepository::<Folder>::new(store.clone(), ids.clone())),
            prompts: Arc::new(StoreRepository::<Prompt>::new(store.clone(), ids.clone())),
            chains: Arc::new(StoreRepository::<Chain>::new(store.clone(), ids.clone())),
            pinned: Arc::new(StoreRepository::<PinnedItem>::new(store.clone(), ids)),
            announcements: AnnouncementRepository::new(store.clone()),
            user: UserDataRepository::new(store.clone()),
            settings: SettingsRepository::new(store),
            tokens: TokenIssuer::new(),
            api_prefix: api_prefix.into(),
        }
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Write the entitled user record so it is present before the first call.
    pub async fn initialize(&self) {
        let user = self.user.initialize().await;
        tracing::info!(
            subscription = %user.subscription_status,
            features = user.features.len(),
            "local backend ready"
        );
    }

    /// Dispatch one intercepted call. Never fails: errors come back as a
    /// `{success: false}` envelope with a matching status.
    #[tracing::instrument(skip_all, fields(method = %req.method, path = %req.path))]
    pub async fn route(&self, req: &RouteRequest) -> RouteResult {
        let route = self.strip_prefix(&req.path);
        let result = self.dispatch(route, req).await;
        if !result.status.is_success() {
            tracing::warn!(route, status = %result.status, "backend call failed");
        }
        result
    }

    fn strip_prefix<'a>(&self, path: &'a str) -> &'a str {
        let path = path.trim_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            return path;
        }
        match path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
            _ => path,
        }
    }

    async fn dispatch(&self, route: &str, req: &RouteRequest) -> RouteResult {
        if segment_is(route, "auth") {
            account::auth(self, route)
        } else if segment_is(route, "payments") {
            account::payments(self).await
        } else if segment_is(route, "subscription") {
            account::subscription(self).await
        } else if segment_is(route, "folder") {
            folders::handle(self, route, req).await.into()
        } else if segment_is(route, "prompts-library") {
            prompts::library(self, req).await.into()
        } else if segment_is(route, "prompt") {
            prompts::handle(self, route, req).await.into()
        } else if segment_is(route, "chains") {
            chains::handle(self, route, req).await.into()
        } else if segment_is(route, "pinned") {
            pinned::handle(self, route, req).await.into()
        } else if segment_is(route, "announcements") {
            RouteResult::data(Payload::Announcements(self.announcements.list().await))
        } else if segment_is(route, "settings") {
            self.settings_route(route, req).await.into()
        } else {
            tracing::debug!(route, "unmapped route, answering generic success");
            RouteResult::empty()
        }
    }

    async fn settings_route(&self, route: &str, req: &RouteRequest) -> Result<Payload, BackendError> {
        let writes = req.method == Method::PUT || req.method == Method::PATCH || req.method == Method::POST;
        match (route.trim_end_matches('/'), writes) {
            ("settings/update", true) | ("settings", true) => {
                let partial = req.json_object("settings")?;
                Ok(Payload::Settings(self.settings.update(partial).await))
            }
            ("settings/update", false) => Err(BackendError::MethodNotAllowed {
                method: req.method.to_string(),
                route: route.to_string(),
            }),
            (_, false) => Ok(Payload::Settings(self.settings.get().await)),
            (_, true) => Err(BackendError::MethodNotAllowed {
                method: req.method.to_string(),
                route: route.to_string(),
            }),
        }
    }
}

/// `route` is exactly `segment` or starts with `segment/`.
fn segment_is(route: &str, segment: &str) -> bool {
    route
        .strip_prefix(segment)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;
    use crate::store::memory_store::MemoryKeyValueStore;
    use hyper::StatusCode;
    use serde_json::{Value, json};

    fn backend() -> LocalBackend {
        LocalBackend::new(
            StoreAdapter::new(Arc::new(MemoryKeyValueStore::new())),
            "/api/",
        )
    }

    async fn call(backend: &LocalBackend, req: RouteRequest) -> (StatusCode, Value) {
        let result = backend.route(&req).await;
        (result.status, serde_json::to_value(&result.body).unwrap())
    }

    #[test]
    fn segment_matching() {
        assert!(segment_is("folder/get", "folder"));
        assert!(segment_is("folder", "folder"));
        assert!(!segment_is("folders/get", "folder"));
        assert!(!segment_is("prompts-library", "prompt"));
    }

    #[test]
    fn prefix_is_stripped() {
        let b = backend();
        assert_eq!(b.strip_prefix("/api/folder/get-all"), "folder/get-all");
        assert_eq!(b.strip_prefix("folder/get-all/"), "folder/get-all");
        assert_eq!(b.strip_prefix("/apix/folder"), "apix/folder");
    }

    #[tokio::test]
    async fn test_folder_scenario() {
        let b = backend();

        let (status, created) = call(
            &b,
            RouteRequest::new(Method::POST, "/api/folder/create").with_body(r#"{"name":"Work"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["success"], true);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (_, listed) = call(&b, RouteRequest::new(Method::GET, "/api/folder/get-all")).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"][0]["name"], "Work");

        let (status, updated) = call(
            &b,
            RouteRequest::new(Method::PUT, format!("/api/folder/update/{id}"))
                .with_body(r#"{"name":"Work2"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["name"], "Work2");

        let (_, listed) = call(&b, RouteRequest::new(Method::GET, "/api/folder/get")).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"][0]["name"], "Work2");

        let (status, deleted) = call(
            &b,
            RouteRequest::new(Method::DELETE, "/api/folder/delete").with_query("id", &id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["data"], json!({"id": id, "deleted": true}));

        let (_, listed) = call(&b, RouteRequest::new(Method::GET, "/api/folder/get-all")).await;
        assert_eq!(listed["data"], json!([]));
    }

    #[tokio::test]
    async fn test_payments_always_valid() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store
            .set_raw(
                "local_user_data",
                json!({"isPremium": false, "isPaid": false, "subscriptionStatus": "canceled"}),
            )
            .await
            .unwrap();
        let b = LocalBackend::new(StoreAdapter::new(store), "/api/");
        let (status, body) = call(&b, RouteRequest::new(Method::GET, "/api/payments/valid/extension")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["isPremiumUser"], true);
        assert_eq!(body["subscriptionStatus"], "active");
    }

    #[tokio::test]
    async fn test_unmapped_path_is_generic_success() {
        let b = backend();
        let (status, body) = call(&b, RouteRequest::new(Method::GET, "/api/foo/bar")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": null}));
    }

    #[tokio::test]
    async fn test_malformed_body_is_500_envelope() {
        let b = backend();
        let (status, body) = call(
            &b,
            RouteRequest::new(Method::POST, "/api/folder/create").with_body("{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("malformed"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_404() {
        let b = backend();
        let (status, body) = call(
            &b,
            RouteRequest::new(Method::PUT, "/api/chains/update/missing").with_body(r#"{"name":"x"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "error": "chain not found: missing"}));
    }

    #[tokio::test]
    async fn test_wrong_method_on_known_action_is_405() {
        let b = backend();
        let (status, body) = call(&b, RouteRequest::new(Method::GET, "/api/folder/create")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);

        let (status, _) = call(&b, RouteRequest::new(Method::PUT, "/api/pinned/whatever")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_entity_action_lists() {
        let b = backend();
        call(
            &b,
            RouteRequest::new(Method::POST, "/api/prompt/create").with_body(r#"{"title":"T","content":"c"}"#),
        )
        .await;
        let (status, body) = call(&b, RouteRequest::new(Method::GET, "/api/prompt/mystery")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["name"], "T");
    }

    #[tokio::test]
    async fn test_get_by_id_requires_id() {
        let b = backend();
        let (status, _) = call(&b, RouteRequest::new(Method::GET, "/api/folder/get-by-id")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, created) = call(
            &b,
            RouteRequest::new(Method::POST, "/api/folder/create").with_body(r#"{"name":"A"}"#),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap();
        let (status, found) = call(
            &b,
            RouteRequest::new(Method::GET, "/api/folder/get-by-id").with_query("id", id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["data"]["name"], "A");
    }

    #[tokio::test]
    async fn test_pinned_folders_filter() {
        let b = backend();
        for body in [r#"{"name":"a","isPinned":true}"#, r#"{"name":"b"}"#] {
            call(&b, RouteRequest::new(Method::POST, "/api/folder/create").with_body(body)).await;
        }
        let (_, body) = call(&b, RouteRequest::new(Method::GET, "/api/folder/pinned")).await;
        let pinned = body["data"].as_array().unwrap();
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0]["name"], "a");
    }

    #[tokio::test]
    async fn test_prompt_library_prepends_starters() {
        let b = backend();
        call(
            &b,
            RouteRequest::new(Method::POST, "/api/prompt/create")
                .with_body(r#"{"name":"Mine","content":"x","category":"coding"}"#),
        )
        .await;
        let (_, body) = call(&b, RouteRequest::new(Method::GET, "/api/prompts-library")).await;
        let all = body["data"].as_array().unwrap();
        let starters = crate::models::prompt::library_prompts().len();
        assert_eq!(all.len(), starters + 1);
        assert_eq!(all[0]["builtIn"], true);
        assert_eq!(all[starters]["name"], "Mine");

        let (_, coding) = call(
            &b,
            RouteRequest::new(Method::GET, "/api/prompts-library").with_query("category", "coding"),
        )
        .await;
        assert!(coding["data"].as_array().unwrap().iter().all(|p| p["category"] == "coding"));
        assert!(coding["data"].as_array().unwrap().iter().any(|p| p["name"] == "Mine"));
    }

    #[tokio::test]
    async fn test_pin_and_unpin() {
        let b = backend();
        let (_, pinned) = call(
            &b,
            RouteRequest::new(Method::POST, "/api/pinned/pin").with_body(r#"{"conversationId":"c1"}"#),
        )
        .await;
        let id = pinned["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(pinned["data"]["conversationId"], "c1");
        assert!(pinned["data"]["pinnedAt"].is_string());

        for expected in [true, false] {
            let (status, body) = call(
                &b,
                RouteRequest::new(Method::DELETE, format!("/api/pinned/unpin/{id}")),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["deleted"], expected);
        }
        let (_, body) = call(&b, RouteRequest::new(Method::GET, "/api/pinned/get")).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_auth_endpoints() {
        let b = backend();
        let (status, token) = call(&b, RouteRequest::new(Method::POST, "/api/auth/generate-jwt")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(token["success"], true);
        assert!(token["token"].as_str().unwrap().contains('.'));

        let (_, jwks) = call(&b, RouteRequest::new(Method::GET, "/api/auth/jwks")).await;
        assert_eq!(jwks, json!({"keys": []}));
    }

    #[tokio::test]
    async fn test_subscription_and_announcements() {
        let b = backend();
        let (_, sub) = call(&b, RouteRequest::new(Method::GET, "/api/subscription/status")).await;
        assert_eq!(sub["data"]["isPremium"], true);
        assert_eq!(sub["data"]["isPaid"], true);

        let (_, ann) = call(&b, RouteRequest::new(Method::GET, "/api/announcements")).await;
        assert!(!ann["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_routes() {
        let b = backend();
        let (_, updated) = call(
            &b,
            RouteRequest::new(Method::PUT, "/api/settings/update").with_body(r#"{"theme":"dark"}"#),
        )
        .await;
        assert_eq!(updated["data"], json!({"theme": "dark"}));

        let (_, got) = call(&b, RouteRequest::new(Method::GET, "/api/settings/get")).await;
        assert_eq!(got["data"], json!({"theme": "dark"}));

        let (status, _) = call(&b, RouteRequest::new(Method::GET, "/api/settings/update")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_routes_without_prefix_work() {
        let b = backend();
        let (status, body) = call(&b, RouteRequest::new(Method::GET, "folder/get-all")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }
}
