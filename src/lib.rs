pub mod config;
pub mod domain;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::store::MemoryStore;

pub async fn create_app() -> axum::Router {
    let state = AppState::new(Arc::new(MemoryStore::new()));

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
