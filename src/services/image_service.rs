//! Listing cover images resolved to bytes, from the blob store or a remote URL.

use tracing::warn;

use crate::{
    dao::{
        blob::{BlobError, BlobRef, sniff_content_type},
        blob_store::blob_id,
    },
    error::ServiceError,
    services::data_access::{self, QueryOutcome},
    state::SharedState,
};

/// Image content resolved for a listing.
#[derive(Debug)]
pub struct ResolvedImage {
    /// Detected MIME type.
    pub content_type: &'static str,
    /// Raw content.
    pub data: Vec<u8>,
}

/// Dereference the image of game `id` to bytes.
///
/// Uploaded images come from the blob store; external URLs are fetched over HTTP, bounded by the
/// client timeout and the configured size limit.
pub async fn resolve_game_image(state: &SharedState, id: &str) -> Result<ResolvedImage, ServiceError> {
    let image = match data_access::get_game(state, id).await? {
        QueryOutcome::Skipped => return Err(ServiceError::Degraded),
        QueryOutcome::Ready(game) => game
            .as_ref()
            .as_ref()
            .map(|game| game.image.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("game `{id}`")))?,
    };

    if let Some(blob) = blob_id(&state.config().blob_base_url, &image.url) {
        let stored = state
            .blob_store()
            .fetch(blob.to_owned())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("image of game `{id}`")))?;
        return Ok(ResolvedImage {
            content_type: stored.content_type,
            data: stored.data.to_vec(),
        });
    }

    let data = BlobRef::from(image)
        .get_bytes(state.http(), state.config().max_image_bytes)
        .await
        .map_err(|err| match err {
            BlobError::InvalidUrl { .. } => ServiceError::NotFound(err.to_string()),
            BlobError::TooLarge { .. } => ServiceError::TooLarge(err.to_string()),
            BlobError::Fetch { .. } | BlobError::Status { .. } => {
                warn!(game_id = id, error = %err, "remote image fetch failed");
                ServiceError::Upstream(err.to_string())
            }
        })?;

    Ok(ResolvedImage {
        content_type: sniff_content_type(&data),
        data,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            blob::BlobRef,
            models::{GameEntity, ImageRef, Platform},
            record_store::memory::MemoryRecordStore,
        },
        state::AppState,
    };

    const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn game(id: &str, url: String) -> GameEntity {
        GameEntity {
            id: id.into(),
            name: "Alpha".into(),
            description: "First".into(),
            platform: Platform::Pc,
            trailer_url: None,
            image: ImageRef { url },
            price: 1,
            on_sale: false,
        }
    }

    async fn ready_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_record_store(Arc::new(MemoryRecordStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn uploaded_images_resolve_from_the_blob_store() {
        let state = ready_state().await;
        let image = state
            .blob_store()
            .upload(BlobRef::from_bytes(PNG.to_vec()))
            .await
            .unwrap();
        data_access::add_game(&state, game("g1", image.url)).await.unwrap();

        let resolved = resolve_game_image(&state, "g1").await.unwrap();
        assert_eq!(resolved.content_type, "image/png");
        assert_eq!(resolved.data, PNG.to_vec());
    }

    #[tokio::test]
    async fn oversize_remote_images_are_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2048\r\nconnection: close\r\n\r\n")
                .await;
            let _ = socket.write_all(&[0u8; 2048]).await;
        });

        let config = AppConfig {
            max_image_bytes: 1024,
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        state
            .set_record_store(Arc::new(MemoryRecordStore::new()))
            .await;
        data_access::add_game(&state, game("g3", format!("http://{addr}/big.png")))
            .await
            .unwrap();

        assert!(matches!(
            resolve_game_image(&state, "g3").await,
            Err(ServiceError::TooLarge(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_remotes_are_upstream_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = ready_state().await;
        data_access::add_game(&state, game("g4", format!("http://{addr}/gone.png")))
            .await
            .unwrap();
        assert!(matches!(
            resolve_game_image(&state, "g4").await,
            Err(ServiceError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn missing_games_and_unfetchable_urls_are_not_found() {
        let state = ready_state().await;
        assert!(matches!(
            resolve_game_image(&state, "nope").await,
            Err(ServiceError::NotFound(_))
        ));

        data_access::add_game(&state, game("g2", "/static/cover.png".into()))
            .await
            .unwrap();
        assert!(matches!(
            resolve_game_image(&state, "g2").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
