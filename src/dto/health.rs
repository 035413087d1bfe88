use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of cached catalog queries.
    pub cached_queries: usize,
    /// Number of connected catalog SSE subscribers.
    pub catalog_subscribers: usize,
}

impl HealthResponse {
    /// Build a response from the degraded flag and runtime counters.
    pub fn new(degraded: bool, cached_queries: usize, catalog_subscribers: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            cached_queries,
            catalog_subscribers,
        }
    }
}
