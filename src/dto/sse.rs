use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialised payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// First event sent to a catalog subscriber.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a record store.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// New degraded flag.
    pub degraded: bool,
}

/// Kind of mutation that invalidated the catalog.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogChange {
    /// A game was added.
    Added,
    /// A game was updated.
    Updated,
    /// A game was deleted.
    Deleted,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after every successful mutation so subscribers refetch their listings.
pub struct CatalogInvalidated {
    /// What happened.
    pub change: CatalogChange,
    /// Affected game.
    pub game_id: Option<String>,
    /// Query keys dropped from the cache, rendered as segment lists.
    pub invalidated: Vec<Vec<String>>,
}
