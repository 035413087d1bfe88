//! Admin panel operations: add/edit through the game form, two-step deletion and listing.

use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        blob::BlobRef,
        blob_store::blob_id,
        models::{GameEntity, ImageRef, Principal},
    },
    dto::{
        admin::{DeleteConfirmationResponse, GameFormRequest},
        game::GameSummary,
    },
    error::ServiceError,
    services::data_access::{self, QueryOutcome},
    state::{
        PendingDeletion, SharedState,
        admin_form::{GameForm, ImageSource},
    },
};

/// Every game, for the admin list. Empty while the store is not ready.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let games = data_access::get_all_games(state)
        .await?
        .ready()
        .map(|games| games.iter().map(GameSummary::from).collect())
        .unwrap_or_default();
    Ok(games)
}

/// Submit the add form.
pub async fn create_game(
    state: &SharedState,
    request: GameFormRequest,
) -> Result<GameSummary, ServiceError> {
    let mut form = GameForm::create();
    apply_request(&mut form, request, true)?;
    submit(state, form, None).await
}

/// Submit the edit form for `id`, pre-filled from the stored record.
pub async fn update_game(
    state: &SharedState,
    id: &str,
    request: GameFormRequest,
) -> Result<GameSummary, ServiceError> {
    let existing = load_existing(state, id).await?;
    let previous_image = existing.image.clone();
    let mut form = GameForm::edit(existing);
    apply_request(&mut form, request, false)?;
    submit(state, form, Some(previous_image)).await
}

async fn load_existing(state: &SharedState, id: &str) -> Result<GameEntity, ServiceError> {
    match data_access::get_game(state, id).await? {
        QueryOutcome::Skipped => Err(ServiceError::Degraded),
        QueryOutcome::Ready(game) => game
            .as_ref()
            .clone()
            .ok_or_else(|| ServiceError::NotFound(format!("game `{id}`"))),
    }
}

fn apply_request(
    form: &mut GameForm,
    request: GameFormRequest,
    is_create: bool,
) -> Result<(), ServiceError> {
    if is_create {
        form.id = request.id;
    }
    if let Some(name) = request.name {
        form.name = name;
    }
    if let Some(price) = request.price {
        form.price = price.into_form_value();
    }
    if let Some(description) = request.description {
        form.description = description;
    }
    if let Some(platform) = request.platform {
        form.platform = Some(platform);
    }
    if let Some(trailer_url) = request.trailer_url {
        form.trailer_url = trailer_url;
    }
    if let Some(on_sale) = request.on_sale {
        form.on_sale = on_sale;
    }
    if let Some(image) = request.image {
        let blob = image.into_blob().map_err(|err| {
            ServiceError::InvalidInput(format!("image data is not valid base64: {err}"))
        })?;
        form.image = Some(blob);
    }
    Ok(())
}

/// Validate, upload the image if needed, then write. Uploaded bytes are discarded again when
/// the write fails; on edits the image they replace is discarded once the write succeeds.
async fn submit(
    state: &SharedState,
    form: GameForm,
    previous_image: Option<ImageRef>,
) -> Result<GameSummary, ServiceError> {
    let draft = form.validate()?;
    // Fail before uploading anything when writes cannot succeed.
    let store = state.require_record_store().await?;
    if draft.is_new && store.find_game(draft.id.clone()).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "game `{}` already exists",
            draft.id
        )));
    }

    let (image, uploaded) = match draft.image.clone() {
        ImageSource::Keep(image) => (image, false),
        ImageSource::Upload(blob) => {
            check_upload_size(state, &blob)?;
            let stores_bytes = matches!(blob, BlobRef::Bytes { .. });
            let game_id = draft.id.clone();
            let blob = blob.with_upload_progress(move |percentage| {
                debug!(game_id = %game_id, percentage, "image upload progress");
            });
            (state.blob_store().upload(blob).await?, stores_bytes)
        }
    };

    let is_new = draft.is_new;
    let entity = draft.into_entity(image.clone());
    let written = if is_new {
        data_access::add_game(state, entity.clone()).await
    } else {
        data_access::update_game(state, &entity.id, entity.clone()).await
    };

    if let Err(err) = written {
        if uploaded {
            discard_image(state, &image).await;
        }
        return Err(err);
    }

    if is_new {
        info!(game_id = %entity.id, "game added");
    } else {
        info!(game_id = %entity.id, "game updated");
    }
    if let Some(previous) = previous_image.filter(|previous| uploaded && *previous != image) {
        discard_image(state, &previous).await;
    }

    Ok(GameSummary::from(entity))
}

fn check_upload_size(state: &SharedState, blob: &BlobRef) -> Result<(), ServiceError> {
    let limit = state.config().max_image_bytes;
    match blob {
        BlobRef::Bytes { data, .. } if data.len() as u64 > limit => Err(ServiceError::TooLarge(
            format!("image is {} bytes, the limit is {limit}", data.len()),
        )),
        _ => Ok(()),
    }
}

/// Drop an image from the blob store when it was uploaded there. Failures are only logged.
async fn discard_image(state: &SharedState, image: &ImageRef) {
    let Some(id) = blob_id(&state.config().blob_base_url, &image.url) else {
        return;
    };
    match state.blob_store().remove(id.to_owned()).await {
        Ok(removed) => debug!(blob_id = id, removed, "discarded image"),
        Err(err) => warn!(blob_id = id, error = %err, "failed to discard image"),
    }
}

/// Issue a single-use confirmation token for deleting `id`.
pub async fn request_delete(
    state: &SharedState,
    caller: &Principal,
    id: &str,
) -> Result<DeleteConfirmationResponse, ServiceError> {
    let game = load_existing(state, id).await?;
    let ttl = state.config().delete_confirmation_ttl;

    state
        .delete_confirmations()
        .retain(|_, pending| pending.issued_at.elapsed() <= ttl);

    let token = Uuid::new_v4().simple().to_string();
    state.delete_confirmations().insert(
        token.clone(),
        PendingDeletion {
            game_id: game.id.clone(),
            principal: caller.clone(),
            issued_at: Instant::now(),
        },
    );
    info!(game_id = %game.id, %caller, "delete confirmation issued");

    Ok(DeleteConfirmationResponse {
        game_id: game.id,
        game_name: game.name,
        token,
        expires_in_secs: ttl.as_secs(),
    })
}

/// Delete `id` after checking the confirmation token. The token is consumed either way.
pub async fn confirm_delete(
    state: &SharedState,
    caller: &Principal,
    id: &str,
    token: Option<String>,
) -> Result<(), ServiceError> {
    let token = token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("missing delete confirmation token".into()))?;

    let (_, pending) = state
        .delete_confirmations()
        .remove(&token)
        .ok_or_else(|| {
            ServiceError::InvalidInput("unknown or already used confirmation token".into())
        })?;

    if pending.issued_at.elapsed() > state.config().delete_confirmation_ttl {
        return Err(ServiceError::InvalidInput(
            "delete confirmation expired".into(),
        ));
    }
    if pending.game_id != id || pending.principal != *caller {
        return Err(ServiceError::InvalidInput(
            "confirmation token was issued for another request".into(),
        ));
    }

    let image = load_existing(state, id).await?.image;
    data_access::delete_game(state, id).await?;
    info!(game_id = id, %caller, "game deleted");
    discard_image(state, &image).await;
    Ok(())
}
