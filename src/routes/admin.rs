use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_valid::Valid;
use tracing::debug;

use crate::{
    dao::models::Principal,
    dto::{
        admin::{AssignRoleRequest, DeleteConfirmationResponse, DeleteGameQuery, GameFormRequest},
        game::GameSummary,
    },
    error::AppError,
    routes::caller::Caller,
    services::{admin_service, auth_service},
    state::{SharedState, auth_gate::GateView},
};

/// Admin-only listing management, gated on the caller's resolved role.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/games", get(list_games).post(create_game))
        .route("/admin/games/{id}", put(update_game).delete(delete_game))
        .route("/admin/games/{id}/delete-request", post(request_delete))
        .route("/admin/roles", post(assign_role))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

#[utoipa::path(
    get,
    path = "/admin/games",
    tag = "admin",
    params(("X-Caller-Principal" = String, Header, description = "Authenticated caller")),
    responses(
        (status = 200, description = "Every listing", body = [GameSummary]),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not an admin")
    )
)]
/// List every game for administration.
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(admin_service::list_games(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/games",
    tag = "admin",
    params(("X-Caller-Principal" = String, Header, description = "Authenticated caller")),
    request_body = GameFormRequest,
    responses(
        (status = 201, description = "Game added", body = GameSummary),
        (status = 400, description = "Form rejected"),
        (status = 409, description = "Id already taken"),
        (status = 413, description = "Image exceeds the size limit"),
        (status = 503, description = "Record store not ready")
    )
)]
/// Add a game from the admin form.
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GameFormRequest>>,
) -> Result<(StatusCode, Json<GameSummary>), AppError> {
    let game = admin_service::create_game(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

#[utoipa::path(
    put,
    path = "/admin/games/{id}",
    tag = "admin",
    params(
        ("X-Caller-Principal" = String, Header, description = "Authenticated caller"),
        ("id" = String, Path, description = "Game identifier")
    ),
    request_body = GameFormRequest,
    responses(
        (status = 200, description = "Game updated", body = GameSummary),
        (status = 400, description = "Form rejected"),
        (status = 404, description = "No such game"),
        (status = 413, description = "Image exceeds the size limit"),
        (status = 503, description = "Record store not ready")
    )
)]
/// Edit a game. Omitted fields keep their stored values.
pub async fn update_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<GameFormRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(admin_service::update_game(&state, &id, payload).await?))
}

#[utoipa::path(
    post,
    path = "/admin/games/{id}/delete-request",
    tag = "admin",
    params(
        ("X-Caller-Principal" = String, Header, description = "Authenticated caller"),
        ("id" = String, Path, description = "Game identifier")
    ),
    responses(
        (status = 200, description = "Confirmation token issued", body = DeleteConfirmationResponse),
        (status = 404, description = "No such game")
    )
)]
/// Ask to delete a game; returns the token the confirming call must carry.
pub async fn request_delete(
    State(state): State<SharedState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmationResponse>, AppError> {
    Ok(Json(
        admin_service::request_delete(&state, &admin, &id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/games/{id}",
    tag = "admin",
    params(
        ("X-Caller-Principal" = String, Header, description = "Authenticated caller"),
        ("id" = String, Path, description = "Game identifier"),
        DeleteGameQuery
    ),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 400, description = "Missing, expired or mismatched confirmation"),
        (status = 404, description = "No such game")
    )
)]
/// Delete a game after confirmation.
pub async fn delete_game(
    State(state): State<SharedState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<String>,
    Query(query): Query<DeleteGameQuery>,
) -> Result<StatusCode, AppError> {
    admin_service::confirm_delete(&state, &admin, &id, query.confirmation).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/roles",
    tag = "admin",
    params(("X-Caller-Principal" = String, Header, description = "Authenticated caller")),
    request_body = AssignRoleRequest,
    responses((status = 204, description = "Role assigned"))
)]
/// Assign a role to a principal.
pub async fn assign_role(
    State(state): State<SharedState>,
    Extension(admin): Extension<Principal>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<StatusCode, AppError> {
    auth_service::assign_role(&state, Some(admin), payload.principal, payload.role).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve the caller's role and only let admins through.
async fn require_admin(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let gate = auth_service::resolve_gate(&state, caller).await;
    match (gate.view(), gate.principal()) {
        (GateView::Granted, Some(principal)) => {
            req.extensions_mut().insert(principal.clone());
            Ok(next.run(req).await)
        }
        (GateView::LoginRequired | GateView::LoggingIn, _) => {
            Err(AppError::Unauthorized("login required".into()))
        }
        (view, principal) => {
            debug!(?view, ?principal, "admin access denied");
            Err(AppError::Forbidden("admin role required".into()))
        }
    }
}
