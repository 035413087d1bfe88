//! Game storefront backend: public catalog, cached data access and an admin-gated listing panel.

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// File and environment configuration.
pub mod config;
/// Persistence layer: records, blobs and their backends.
pub mod dao;
/// Wire types exchanged over HTTP and SSE.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared application state.
pub mod state;

/// Build the top-level router and attach cross-cutting middleware layers.
pub fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
