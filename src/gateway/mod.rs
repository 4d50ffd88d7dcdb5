pub mod transport;

use std::sync::Arc;

use anyhow::Result;
use hyper::StatusCode;

use crate::backend::{LocalBackend, RouteRequest};
use crate::config::Config;
use crate::synth::{self, GatewayResponse};

pub use transport::{HttpTransport, OutboundRequest, ReqwestTransport};

tokio::task_local! {
    static DEPTH: usize;
}

/// Nesting depth of gateway calls on the current task. Zero outside any call.
pub fn current_depth() -> usize {
    DEPTH.try_with(|depth| *depth).unwrap_or(0)
}

/// Which hosts are served locally.
#[derive(Debug, Clone)]
pub struct InterceptPolicy {
    blocked: Vec<String>,
    allowed: Vec<String>,
}

impl InterceptPolicy {
    pub fn new(blocked: Vec<String>, allowed: Vec<String>) -> Self {
        Self { blocked, allowed }
    }

    /// Blocked hosts and their subdomains are intercepted unless the host
    /// is also allowlisted.
    pub fn intercepts(&self, host: &str) -> bool {
        let listed = |hosts: &[String]| hosts.iter().any(|pattern| host_matches(host, pattern));
        !listed(&self.allowed) && listed(&self.blocked)
    }
}

fn host_matches(host: &str, pattern: &str) -> bool {
    match host.strip_suffix(pattern) {
        Some("") => true,
        Some(rest) => rest.ends_with('.'),
        None => false,
    }
}

/// The single entry point for outgoing HTTP. Requests to a blocked host are
/// answered by the local backend; everything else goes to the transport.
pub struct NetworkGateway {
    transport: Arc<dyn HttpTransport>,
    backend: Arc<LocalBackend>,
    policy: InterceptPolicy,
    max_depth: usize,
}

impl NetworkGateway {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        backend: Arc<LocalBackend>,
        policy: InterceptPolicy,
        max_depth: usize,
    ) -> Self {
        Self {
            transport,
            backend,
            policy,
            max_depth,
        }
    }

    pub fn from_config(config: &Config, transport: Arc<dyn HttpTransport>, backend: Arc<LocalBackend>) -> Self {
        let policy = InterceptPolicy::new(config.blocked_hosts.clone(), config.allowed_hosts.clone());
        Self::new(transport, backend, policy, config.max_intercept_depth)
    }

    /// Intercepted requests always resolve to `Ok`, including the 508 answer
    /// once nested calls pass `max_depth`. Only pass-through failures are `Err`.
    pub async fn fetch(&self, request: OutboundRequest) -> Result<GatewayResponse> {
        let depth = current_depth();
        if depth >= self.max_depth {
            tracing::warn!(
                depth,
                max_depth = self.max_depth,
                url = %request.url,
                "gateway nesting too deep, failing closed"
            );
            return Ok(synth::failure(
                StatusCode::LOOP_DETECTED,
                &format!("maximum interception depth ({}) exceeded", self.max_depth),
            ));
        }
        DEPTH.scope(depth + 1, self.dispatch(request)).await
    }

    async fn dispatch(&self, request: OutboundRequest) -> Result<GatewayResponse> {
        let intercept = request.host().is_some_and(|host| self.policy.intercepts(&host));
        if !intercept {
            tracing::debug!(method = %request.method, url = %request.url, "passing request through");
            return self.transport.send(request).await;
        }

        tracing::debug!(method = %request.method, url = %request.url, "intercepting request");
        let result = self.backend.route(&route_request(&request)).await;
        Ok(synth::from_route(&result))
    }
}

fn route_request(request: &OutboundRequest) -> RouteRequest {
    let mut route = RouteRequest::new(request.method.clone(), request.url.path());
    route.query = request.url.query_pairs().into_owned().collect();
    route.body = request
        .body
        .as_ref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
    route
}
