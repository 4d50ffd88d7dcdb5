use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::Span;

use super::AppState;
use crate::gateway::OutboundRequest;
use crate::gateway::transport::strip_hop_by_hop;

/// Upper bound on a proxied request body.
const MAX_PROXY_BODY: usize = 16 * 1024 * 1024;

pub async fn enrich_current_span_middleware(req: Request<Body>, next: Next) -> Response {
    let uri: &Uri = req.uri();

    let host = uri
        .host()
        .or_else(|| req.headers().get("host").and_then(|h| h.to_str().ok()))
        .unwrap_or("UNKNOWN");

    let current_span = Span::current();

    current_span.record("http.method", req.method().as_str());
    current_span.record("http.uri", uri.path());
    current_span.record("http.host", host);
    if let Some(query) = uri.query() {
        current_span.record("http.query", query);
    }

    next.run(req).await
}

/// Absolute-form requests (`GET http://host/path`) are proxy traffic and go
/// through the gateway. Origin-form requests continue to the router.
pub async fn forward_proxy_requests(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let uri = req.uri();
    if uri.scheme().is_none() || uri.authority().is_none() {
        return next.run(req).await;
    }

    let url = match Url::parse(&uri.to_string()) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(uri = %uri, error = %e, "rejecting unparseable proxy target");
            return (StatusCode::BAD_REQUEST, "invalid proxy target").into_response();
        }
    };

    let (parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(body, MAX_PROXY_BODY).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "failed to read proxied request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    let request = OutboundRequest {
        method: parts.method,
        url,
        headers,
        body: (!body.is_empty()).then_some(body),
    };

    match state.gateway.fetch(request).await {
        Ok(resp) => resp.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "pass-through request failed");
            (StatusCode::BAD_GATEWAY, format!("upstream request failed: {e:#}")).into_response()
        }
    }
}
