use serde::{Deserialize, Serialize};
use serde_with::{StringWithSeparator, formats::CommaSeparator, serde_as, skip_serializing_none};
use utoipa::{IntoParams, ToSchema};

use crate::dto::game::GameSummary;

/// Query string of the catalog view.
///
/// `offsets` carries the last scroll position of each row, in row order. A navigation control
/// click is sent as `scroll_row` plus `scroll_by`.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Case-insensitive name filter; empty matches everything.
    #[serde(default)]
    pub q: String,
    /// Width of the client's row viewport, in CSS pixels.
    pub viewport_width: Option<f64>,
    /// Comma-separated scroll offset per row; missing rows start at 0.
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, f64>")]
    #[serde(default)]
    #[param(value_type = Option<String>, example = "0,250")]
    pub offsets: Vec<f64>,
    /// Row whose navigation control was clicked.
    pub scroll_row: Option<usize>,
    /// Distance scrolled by that click; negative moves towards the start.
    pub scroll_by: Option<f64>,
}

/// Distinct user-visible catalog states.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    /// The listing is not available yet.
    Loading,
    /// The listing could not be fetched.
    Error,
    /// No games exist.
    Empty,
    /// Games exist but none match the query.
    NoMatches,
    /// Matching games are listed in `rows`.
    Ready,
}

/// One horizontally scrollable row of the catalog.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogRow {
    /// Games in display order.
    pub games: Vec<GameSummary>,
    /// Total width of the row content, in CSS pixels.
    pub content_width: f64,
    /// Scroll offset after clamping to the row bounds.
    pub offset: f64,
    /// Whether the "scroll towards start" control is shown.
    pub show_start: bool,
    /// Whether the "scroll towards end" control is shown.
    pub show_end: bool,
}

/// Catalog view rendered for a search query.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    /// View state.
    pub status: CatalogStatus,
    /// Query the view was rendered for.
    pub query: String,
    /// User-facing notice for non-ready states.
    pub message: Option<String>,
    /// Number of games in the store.
    pub total: usize,
    /// Number of games matching the query.
    pub matched: usize,
    /// Matching games grouped into rows.
    pub rows: Vec<CatalogRow>,
}
