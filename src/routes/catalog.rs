use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::{
    dao::models::Platform,
    dto::{
        catalog::{CatalogQuery, CatalogResponse},
        game::{ContactLinkResponse, GameSummary},
    },
    error::AppError,
    services::{
        catalog_service, contact_link,
        data_access::{self, GamesOutcome, QueryOutcome},
        image_service,
    },
    state::SharedState,
};

/// Public catalog endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games))
        .route("/games/on-sale", get(list_on_sale_games))
        .route("/games/platform/{platform}", get(list_games_by_platform))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/contact", get(get_contact_link))
        .route("/games/{id}/image", get(get_game_image))
        .route("/catalog", get(get_catalog))
}

/// Skipped reads render as an empty listing.
fn summaries(outcome: GamesOutcome) -> Json<Vec<GameSummary>> {
    let games = outcome
        .ready()
        .map(|games| games.iter().map(GameSummary::from).collect())
        .unwrap_or_default();
    Json(games)
}

#[utoipa::path(
    get,
    path = "/games",
    tag = "catalog",
    responses(
        (status = 200, description = "Every listing in insertion order; empty while the store is not ready", body = [GameSummary])
    )
)]
/// List every game.
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(summaries(data_access::get_all_games(&state).await?))
}

#[utoipa::path(
    get,
    path = "/games/on-sale",
    tag = "catalog",
    responses(
        (status = 200, description = "Listings flagged on sale", body = [GameSummary])
    )
)]
/// List games currently on sale.
pub async fn list_on_sale_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(summaries(data_access::get_on_sale_games(&state).await?))
}

#[utoipa::path(
    get,
    path = "/games/platform/{platform}",
    tag = "catalog",
    params(("platform" = Platform, Path, description = "Platform identifier")),
    responses(
        (status = 200, description = "Listings for the platform", body = [GameSummary]),
        (status = 400, description = "Unknown platform")
    )
)]
/// List games for one platform.
pub async fn list_games_by_platform(
    State(state): State<SharedState>,
    Path(platform): Path<Platform>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(summaries(
        data_access::get_games_by_platform(&state, platform).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "catalog",
    params(("id" = String, Path, description = "Game identifier")),
    responses((status = 200, description = "The listing, null when missing or while the store is not ready", body = Option<GameSummary>))
)]
/// Fetch a single game.
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Option<GameSummary>>, AppError> {
    let game = match data_access::get_game(&state, &id).await? {
        QueryOutcome::Skipped => None,
        QueryOutcome::Ready(game) => game.as_ref().as_ref().map(GameSummary::from),
    };
    Ok(Json(game))
}

#[utoipa::path(
    get,
    path = "/games/{id}/contact",
    tag = "catalog",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Purchase enquiry deep link", body = ContactLinkResponse),
        (status = 404, description = "No such game"),
        (status = 503, description = "Record store not ready")
    )
)]
/// Build the "buy now" messaging link for a game.
pub async fn get_contact_link(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ContactLinkResponse>, AppError> {
    Ok(Json(contact_link::contact_link(&state, &id).await?))
}

#[utoipa::path(
    get,
    path = "/games/{id}/image",
    tag = "catalog",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Image content of the listing", content_type = "application/octet-stream"),
        (status = 404, description = "No such game or image"),
        (status = 413, description = "Remote image exceeds the size limit"),
        (status = 502, description = "Image host failed or timed out"),
        (status = 503, description = "Record store not ready")
    )
)]
/// Dereference a listing's image to its bytes.
pub async fn get_game_image(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let image = image_service::resolve_game_image(&state, &id).await?;
    Ok((
        [(header::CONTENT_TYPE, image.content_type)],
        Bytes::from(image.data),
    ))
}

#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Rendered catalog view", body = CatalogResponse),
        (status = 400, description = "Malformed scroll offsets")
    )
)]
/// Render the catalog view: filtered, grouped into rows, with scroll affordances.
pub async fn get_catalog(
    State(state): State<SharedState>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogResponse> {
    Json(catalog_service::render_catalog(&state, query).await)
}
