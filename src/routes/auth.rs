use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dao::models::UserRole,
    dto::auth::{CallerRoleResponse, GateResponse},
    error::AppError,
    routes::caller::Caller,
    services::auth_service,
    state::SharedState,
};

/// Caller identity and role endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/gate", get(get_gate))
        .route("/auth/role", get(get_role))
}

#[utoipa::path(
    get,
    path = "/auth/gate",
    tag = "auth",
    params(("X-Caller-Principal" = Option<String>, Header, description = "Authenticated caller")),
    responses((status = 200, description = "Admin gate state for the caller", body = GateResponse))
)]
/// Resolve the admin gate for the caller.
pub async fn get_gate(State(state): State<SharedState>, Caller(caller): Caller) -> Json<GateResponse> {
    let gate = auth_service::resolve_gate(&state, caller).await;
    Json(GateResponse::from(&gate))
}

#[utoipa::path(
    get,
    path = "/auth/role",
    tag = "auth",
    params(("X-Caller-Principal" = Option<String>, Header, description = "Authenticated caller")),
    responses(
        (status = 200, description = "Effective role of the caller", body = CallerRoleResponse),
        (status = 503, description = "Record store not ready")
    )
)]
/// Report the caller's effective role.
pub async fn get_role(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<Json<CallerRoleResponse>, AppError> {
    let role = auth_service::caller_role(&state, caller.as_ref()).await?;
    Ok(Json(CallerRoleResponse {
        principal: caller,
        role,
        is_admin: role == UserRole::Admin,
    }))
}
