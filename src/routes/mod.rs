use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod auth;
pub mod blobs;
pub mod caller;
pub mod catalog;
pub mod docs;
pub mod health;
pub mod profile;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(catalog::router())
        .merge(auth::router())
        .merge(profile::router())
        .merge(blobs::router())
        .merge(sse::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router())
        .with_state(state)
}
