pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;

use crate::backend::LocalBackend;
use crate::gateway::NetworkGateway;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<LocalBackend>,
    pub gateway: Arc<NetworkGateway>,
}

pub fn create_app(state: AppState) -> Router {
    routes::build_router(state)
}
