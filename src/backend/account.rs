use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use super::LocalBackend;
use super::response::{ApiResponse, AuthToken, Envelope, Jwks, Payload, RouteResult};
use crate::models::Entitlement;

const TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 30;
const SUBJECT: &str = "local-user";

#[derive(Debug, Serialize)]
struct Claims<'a> {
    sub: &'a str,
    iat: i64,
    exp: i64,
    premium: bool,
}

/// Signs HS256 tokens with a per-process random secret. Nothing ever
/// verifies them; clients only need something token-shaped.
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new() -> Self {
        let secret = Uuid::new_v4();
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self) -> AuthToken {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: SUBJECT,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            premium: true,
        };
        let token = match jsonwebtoken::encode(&Header::default(), &claims, &self.key) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "failed to sign local token, using opaque token");
                format!("local-{}", Uuid::new_v4())
            }
        };
        AuthToken {
            success: true,
            token,
            token_type: "Bearer",
            expires_in: TOKEN_TTL_SECS,
        }
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new()
    }
}

/// `auth/*`: every call succeeds.
pub(crate) fn auth(backend: &LocalBackend, route: &str) -> RouteResult {
    if route.trim_end_matches('/') == "auth/jwks" {
        return RouteResult::ok(ApiResponse::Jwks(Jwks::default()));
    }
    RouteResult::ok(ApiResponse::Token(backend.tokens.issue()))
}

/// `payments/*`: always valid, whatever is stored.
pub(crate) async fn payments(backend: &LocalBackend) -> RouteResult {
    let user = backend.user.get().await;
    RouteResult::ok(ApiResponse::Entitlement(Entitlement::from(&user)))
}

/// `subscription/*`: the user record in an envelope.
pub(crate) async fn subscription(backend: &LocalBackend) -> RouteResult {
    let user = backend.user.get().await;
    RouteResult::ok(ApiResponse::Envelope(Envelope::ok(Some(Payload::User(user)))))
}
