use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/catalog",
    tag = "sse",
    responses((status = 200, description = "Catalog change notifications", content_type = "text/event-stream", body = String))
)]
/// Stream catalog invalidations and degraded mode changes.
pub async fn catalog_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (handshake, receiver) = sse_service::subscribe_catalog(&state);
    info!("new catalog SSE connection");
    sse_service::to_sse_stream(handshake, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/catalog", get(catalog_stream))
}
