//! Catalog view assembly: filtered rows of game cards, each with its own scroll state.

use tracing::warn;

use crate::{
    config::CatalogConfig,
    dto::{
        catalog::{CatalogQuery, CatalogResponse, CatalogRow, CatalogStatus},
        game::GameSummary,
    },
    services::data_access::{self, QueryOutcome},
    state::{
        SharedState,
        catalog::{CatalogContent, CatalogSource, build_catalog},
        scroll_row::{ScrollRow, row_content_width},
    },
};

const LOAD_ERROR_MESSAGE: &str = "Error loading games. Please try again later.";
const EMPTY_MESSAGE: &str = "No games available yet. Check back soon!";

/// Render the catalog view for a search query.
pub async fn render_catalog(state: &SharedState, query: CatalogQuery) -> CatalogResponse {
    let outcome = data_access::get_all_games(state).await;
    let content = match &outcome {
        Ok(QueryOutcome::Skipped) => build_catalog(CatalogSource::Loading, &query.q, 0),
        Err(err) => {
            warn!(error = %err, "failed to load catalog");
            build_catalog(CatalogSource::Failed(LOAD_ERROR_MESSAGE), &query.q, 0)
        }
        Ok(QueryOutcome::Ready(games)) => build_catalog(
            CatalogSource::Loaded(games),
            &query.q,
            state.config().catalog.row_size,
        ),
    };

    let viewport = query
        .viewport_width
        .filter(|width| width.is_finite() && *width > 0.0)
        .unwrap_or(state.config().catalog.default_viewport_width);

    let scroll = RowScroll {
        viewport,
        offsets: query.offsets,
        nudge: query.scroll_row.zip(query.scroll_by),
    };
    into_response(content, query.q, &scroll, &state.config().catalog)
}

/// Scroll state reported by the client for the rendered rows.
struct RowScroll {
    viewport: f64,
    offsets: Vec<f64>,
    nudge: Option<(usize, f64)>,
}

impl RowScroll {
    /// Replay the row's last scroll event and any pending navigation click.
    fn row(&self, index: usize, content_width: f64, tolerance: f64) -> ScrollRow {
        let mut row = ScrollRow::new(self.viewport, content_width, tolerance);
        if let Some(offset) = self.offsets.get(index).filter(|offset| offset.is_finite()) {
            row.on_scroll(*offset);
        }
        if let Some((_, delta)) = self
            .nudge
            .filter(|(target, delta)| *target == index && delta.is_finite())
        {
            row.scroll_by(delta);
        }
        row
    }
}

fn into_response(
    content: CatalogContent,
    query: String,
    scroll: &RowScroll,
    layout: &CatalogConfig,
) -> CatalogResponse {
    let empty = |status, message: Option<String>, query| CatalogResponse {
        status,
        query,
        message,
        total: 0,
        matched: 0,
        rows: Vec::new(),
    };

    match content {
        CatalogContent::Loading => empty(CatalogStatus::Loading, None, query),
        CatalogContent::Error(message) => empty(CatalogStatus::Error, Some(message), query),
        CatalogContent::Empty => empty(CatalogStatus::Empty, Some(EMPTY_MESSAGE.into()), query),
        CatalogContent::NoMatches { query } => {
            let message = format!("No games found matching \"{query}\"");
            empty(CatalogStatus::NoMatches, Some(message), query)
        }
        CatalogContent::Rows {
            total,
            matched,
            rows,
        } => CatalogResponse {
            status: CatalogStatus::Ready,
            query,
            message: None,
            total,
            matched,
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(index, games)| {
                    let content_width =
                        row_content_width(games.len(), layout.card_width, layout.card_gap);
                    let row = scroll.row(index, content_width, layout.edge_tolerance);
                    let controls = row.controls();
                    CatalogRow {
                        games: games.iter().map(GameSummary::from).collect(),
                        content_width,
                        offset: row.offset(),
                        show_start: controls.show_start,
                        show_end: controls.show_end,
                    }
                })
                .collect(),
        },
    }
}
