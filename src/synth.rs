use axum::body::Bytes;
use axum::response::{IntoResponse, Response};
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::json;

use crate::backend::RouteResult;

/// Marks a response as produced in-process rather than by the network.
pub const SYNTHESIZED_HEADER: &str = "x-local-backend";
pub const SYNTHESIZED_VALUE: &str = "synthesized";

/// A complete HTTP response, either synthesized locally or read back from a
/// pass-through request.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn is_synthesized(&self) -> bool {
        self.headers
            .get(SYNTHESIZED_HEADER)
            .is_some_and(|v| v == SYNTHESIZED_VALUE)
    }

    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Serialize `body` as JSON with the given status.
///
/// If serialization itself fails the result is a 500 `{success: false}`
/// envelope, so a response always comes back.
pub fn synthesize<T: Serialize>(status: StatusCode, body: &T) -> GatewayResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => build(status, Bytes::from(bytes)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize synthesized response");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &format!("failed to serialize response: {e}"))
        }
    }
}

pub fn from_route(result: &RouteResult) -> GatewayResponse {
    synthesize(result.status, &result.body)
}

/// `{success: false, error}` with the given status.
pub fn failure(status: StatusCode, message: &str) -> GatewayResponse {
    let body = json!({ "success": false, "error": message }).to_string();
    build(status, Bytes::from(body))
}

fn build(status: StatusCode, body: Bytes) -> GatewayResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static(SYNTHESIZED_HEADER),
        HeaderValue::from_static(SYNTHESIZED_VALUE),
    );
    GatewayResponse {
        status,
        headers,
        body,
    }
}
