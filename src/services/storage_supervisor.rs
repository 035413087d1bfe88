use std::{future::Future, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    config::StorageBackend,
    dao::{
        blob_store::{BlobStore, memory::MemoryBlobStore},
        record_store::{RecordStore, memory::MemoryRecordStore},
        storage::{StorageError, StorageResult},
    },
    services::auth_service,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Record and blob stores provided by one connected backend.
#[derive(Clone)]
pub struct Backend {
    /// Game, profile and role records.
    pub records: Arc<dyn RecordStore>,
    /// Uploaded images.
    pub blobs: Arc<dyn BlobStore>,
}

/// Connection factory for the configured backend.
///
/// The memory backend is created once so reconnects keep its records and uploads.
pub fn connector(
    backend: StorageBackend,
    blob_base_url: String,
) -> impl FnMut() -> BoxFuture<'static, StorageResult<Backend>> + Send + 'static {
    let memory = Backend {
        records: Arc::new(MemoryRecordStore::new()),
        blobs: Arc::new(MemoryBlobStore::new(blob_base_url.clone())),
    };
    move || {
        let backend = backend.clone();
        let memory = memory.clone();
        let blob_base_url = blob_base_url.clone();
        Box::pin(async move {
            match backend {
                StorageBackend::Memory => Ok(memory),
                StorageBackend::Mongo { uri, database } => {
                    connect_mongo(uri, database, blob_base_url).await
                }
            }
        })
    }
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo(
    uri: String,
    database: Option<String>,
    blob_base_url: String,
) -> StorageResult<Backend> {
    use crate::dao::record_store::mongodb::{MongoBlobStore, MongoConfig, MongoRecordStore};

    let config = MongoConfig::from_uri(&uri, database.as_deref()).await?;
    let store = MongoRecordStore::connect(config).await?;
    Ok(Backend {
        blobs: Arc::new(MongoBlobStore::new(store.clone(), blob_base_url)),
        records: Arc::new(store),
    })
}

#[cfg(not(feature = "mongo-store"))]
async fn connect_mongo(
    _uri: String,
    _database: Option<String>,
    _blob_base_url: String,
) -> StorageResult<Backend> {
    Err(StorageError::rejected(
        "mongo backend requested but the `mongo-store` feature is disabled",
    ))
}

async fn install(state: &SharedState, backend: Backend) -> StorageResult<()> {
    let seeded = auth_service::seed_bootstrap_admins(state, &backend.records).await?;
    if seeded > 0 {
        info!(seeded, "bootstrap admins seeded");
    }
    state.query_cache().clear();
    state.set_blob_store(backend.blobs);
    state.set_record_store(backend.records).await;
    Ok(())
}

/// Connect to the record store and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Backend, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let backend = match connect().await {
            Ok(backend) => backend,
            Err(err) => {
                warn!(error = %err, "record store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        let store = backend.records.clone();
        if let Err(err) = install(&state, backend).await {
            warn!(error = %err, "failed to prepare record store; retrying");
            sleep(delay).await;
            delay = (delay * 2).min(MAX_DELAY);
            continue;
        }
        info!("record store connected; leaving degraded mode");
        delay = INITIAL_DELAY;

        watch_health(&state, store.as_ref()).await;

        state.clear_record_store().await;
        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the installed store until it fails and cannot be revived in place.
async fn watch_health(state: &SharedState, store: &dyn RecordStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("record store healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        let mut reconnect_delay = INITIAL_DELAY;
        let mut reconnected = false;
        for attempt in 0..MAX_RECONNECT_ATTEMPTS {
            match store.try_reconnect().await {
                Ok(()) => {
                    info!(attempt, "record store reconnected after failed health check");
                    reconnected = true;
                    break;
                }
                Err(err) => {
                    if attempt == 0 {
                        warn!(attempt, error = %err, "record store reconnect failed; entering degraded mode");
                        state.update_degraded(true);
                    } else {
                        warn!(attempt, error = %err, "record store reconnect attempt failed");
                    }
                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                }
            }
        }

        if !reconnected {
            warn!("exhausted record store reconnect attempts; staying in degraded mode");
            return;
        }
        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            blob::BlobRef,
            models::{Principal, UserRole},
        },
        state::AppState,
    };

    #[tokio::test]
    async fn memory_backend_leaves_degraded_mode_and_seeds_admins() {
        let config = AppConfig {
            bootstrap_admins: vec![Principal::new("root")],
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        assert!(state.is_degraded());

        let mut watcher = state.degraded_watcher();
        tokio::spawn(run(
            state.clone(),
            connector(StorageBackend::Memory, "/blobs".into()),
        ));
        tokio::time::timeout(Duration::from_secs(2), watcher.wait_for(|degraded| !degraded))
            .await
            .unwrap()
            .unwrap();

        let store = state.record_store().await.unwrap();
        assert_eq!(
            store.find_role(Principal::new("root")).await.unwrap(),
            Some(UserRole::Admin)
        );
    }

    #[tokio::test]
    async fn memory_connector_reuses_the_same_stores() {
        let mut connect = connector(StorageBackend::Memory, "/blobs".into());
        let first = connect().await.unwrap();
        first
            .records
            .save_role(Principal::new("alice"), UserRole::User)
            .await
            .unwrap();
        let image = first
            .blobs
            .upload(BlobRef::from_bytes(vec![1, 2, 3]))
            .await
            .unwrap();

        let second = connect().await.unwrap();
        assert_eq!(
            second
                .records
                .find_role(Principal::new("alice"))
                .await
                .unwrap(),
            Some(UserRole::User)
        );
        let id = image.url.trim_start_matches("/blobs/").to_owned();
        assert!(second.blobs.fetch(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn installing_a_backend_switches_the_blob_store() {
        let state = AppState::new(AppConfig::default());
        let mut connect = connector(StorageBackend::Memory, "/blobs".into());
        let backend = connect().await.unwrap();
        let image = backend
            .blobs
            .upload(BlobRef::from_bytes(vec![4, 5, 6]))
            .await
            .unwrap();
        let id = image.url.trim_start_matches("/blobs/").to_owned();

        install(&state, backend).await.unwrap();
        assert!(!state.is_degraded());
        assert!(state.blob_store().fetch(id).await.unwrap().is_some());
    }
}
