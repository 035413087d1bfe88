use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dao::models::Principal,
    dto::auth::UserProfileDto,
    error::AppError,
    routes::caller::Caller,
    services::profile_service,
    state::SharedState,
};

/// Self-service profile endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .route("/profiles/{principal}", get(get_user_profile))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    params(("X-Caller-Principal" = String, Header, description = "Authenticated caller")),
    responses(
        (status = 200, description = "Caller profile, null until set up", body = Option<UserProfileDto>),
        (status = 401, description = "Not logged in")
    )
)]
/// Fetch the caller's own profile.
pub async fn get_profile(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<Json<Option<UserProfileDto>>, AppError> {
    Ok(Json(profile_service::get_caller_profile(&state, caller).await?))
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "profile",
    params(("X-Caller-Principal" = String, Header, description = "Authenticated caller")),
    request_body = UserProfileDto,
    responses(
        (status = 200, description = "Profile saved", body = UserProfileDto),
        (status = 400, description = "Blank name"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Guests cannot save a profile")
    )
)]
/// Create or replace the caller's own profile.
pub async fn save_profile(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<UserProfileDto>>,
) -> Result<Json<UserProfileDto>, AppError> {
    Ok(Json(
        profile_service::save_caller_profile(&state, caller, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/profiles/{principal}",
    tag = "profile",
    params(
        ("X-Caller-Principal" = String, Header, description = "Authenticated caller"),
        ("principal" = String, Path, description = "Profile owner")
    ),
    responses(
        (status = 200, description = "Profile, null when absent", body = Option<UserProfileDto>),
        (status = 403, description = "Caller is neither the owner nor an admin")
    )
)]
/// Fetch another principal's profile.
pub async fn get_user_profile(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(target): Path<String>,
) -> Result<Json<Option<UserProfileDto>>, AppError> {
    let target = Principal::new(target);
    Ok(Json(
        profile_service::get_user_profile(&state, caller, target).await?,
    ))
}
