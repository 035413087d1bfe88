use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::{
    error::{AppError, ServiceError},
    state::SharedState,
};

/// Serves uploaded listing images.
pub fn router() -> Router<SharedState> {
    Router::new().route("/blobs/{id}", get(get_blob))
}

#[utoipa::path(
    get,
    path = "/blobs/{id}",
    tag = "blobs",
    params(("id" = String, Path, description = "Blob identifier")),
    responses(
        (status = 200, description = "Raw image content", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown blob")
    )
)]
/// Return uploaded content with its detected content type.
pub async fn get_blob(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let blob = state
        .blob_store()
        .fetch(id.clone())
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AppError::NotFound(format!("blob `{id}`")))?;

    Ok((
        [(header::CONTENT_TYPE, blob.content_type)],
        Bytes::copy_from_slice(&blob.data),
    ))
}
