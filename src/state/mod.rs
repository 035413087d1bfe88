pub mod admin_form;
pub mod auth_gate;
pub mod catalog;
pub mod query_cache;
pub mod scroll_row;
mod sse;

use std::{sync::Arc, time::Instant};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{
        blob_store::{BlobStore, memory::MemoryBlobStore},
        models::Principal,
        record_store::RecordStore,
    },
    dto::sse::SystemStatus,
    error::ServiceError,
};

pub use self::query_cache::{CachedQuery, QueryCache, QueryKey};
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

const CATALOG_SSE_CAPACITY: usize = 32;

/// Single-use delete confirmation issued to an admin.
#[derive(Debug, Clone)]
pub struct PendingDeletion {
    /// Game the confirmation is bound to.
    pub game_id: String,
    /// Admin the confirmation was issued to.
    pub principal: Principal,
    /// Issue time, used for expiry.
    pub issued_at: Instant,
}

/// Central application state holding the storage handles, the query cache and event hubs.
pub struct AppState {
    record_store: RwLock<Option<Arc<dyn RecordStore>>>,
    blob_store: watch::Sender<Arc<dyn BlobStore>>,
    query_cache: QueryCache,
    delete_confirmations: DashMap<String, PendingDeletion>,
    catalog_sse: SseHub,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    http: reqwest::Client,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a record store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let blob_store = Arc::new(MemoryBlobStore::new(config.blob_base_url.clone()));
        Self::with_blob_store(config, blob_store)
    }

    /// Same as [`AppState::new`] with an explicit blob store.
    pub fn with_blob_store(config: AppConfig, blob_store: Arc<dyn BlobStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let (blob_store_tx, _rx) = watch::channel(blob_store);
        let http = reqwest::Client::builder()
            .timeout(config.image_fetch_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to build HTTP client with timeout; using defaults");
                reqwest::Client::new()
            });
        Arc::new(Self {
            record_store: RwLock::new(None),
            blob_store: blob_store_tx,
            query_cache: QueryCache::with_ttl(config.query_cache_ttl),
            delete_confirmations: DashMap::new(),
            catalog_sse: SseHub::new(CATALOG_SSE_CAPACITY),
            degraded: degraded_tx,
            config,
            http,
        })
    }

    /// Obtain a handle to the current record store, if one is installed.
    pub async fn record_store(&self) -> Option<Arc<dyn RecordStore>> {
        let guard = self.record_store.read().await;
        guard.as_ref().cloned()
    }

    /// Record store handle, or [`ServiceError::Degraded`] while none is usable.
    pub async fn require_record_store(&self) -> Result<Arc<dyn RecordStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.record_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a record store implementation and leave degraded mode.
    pub async fn set_record_store(&self, store: Arc<dyn RecordStore>) {
        {
            let mut guard = self.record_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current record store and enter degraded mode.
    pub async fn clear_record_store(&self) {
        {
            let mut guard = self.record_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, broadcasting a status event when the value changes.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });

        if changed {
            self.catalog_sse
                .publish("system_status", &SystemStatus { degraded: value });
        }
    }

    /// Cache of record store reads.
    pub fn query_cache(&self) -> &QueryCache {
        &self.query_cache
    }

    /// Storage collaborator for uploaded images.
    pub fn blob_store(&self) -> Arc<dyn BlobStore> {
        self.blob_store.borrow().clone()
    }

    /// Swap the blob store, e.g. for the one provided by the connected backend.
    pub fn set_blob_store(&self, store: Arc<dyn BlobStore>) {
        self.blob_store.send_replace(store);
    }

    /// Outstanding delete confirmations keyed by token.
    pub fn delete_confirmations(&self) -> &DashMap<String, PendingDeletion> {
        &self.delete_confirmations
    }

    /// Broadcast hub for catalog change notifications.
    pub fn catalog_sse(&self) -> &SseHub {
        &self.catalog_sse
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared outbound HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::record_store::memory::MemoryRecordStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_record_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .set_record_store(Arc::new(MemoryRecordStore::new()))
            .await;
        assert!(!state.is_degraded());
        assert!(state.require_record_store().await.is_ok());

        state.clear_record_store().await;
        assert!(state.is_degraded());
    }

    #[tokio::test]
    async fn blob_store_can_be_swapped() {
        let state = AppState::new(AppConfig::default());
        let replacement = Arc::new(MemoryBlobStore::new("/blobs"));
        let image = replacement
            .upload(crate::dao::blob::BlobRef::from_bytes(vec![1, 2, 3]))
            .await
            .unwrap();
        let id = image.url.trim_start_matches("/blobs/").to_owned();
        assert!(state.blob_store().fetch(id.clone()).await.unwrap().is_none());

        state.set_blob_store(replacement);
        assert!(state.blob_store().fetch(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn degraded_changes_are_broadcast_once() {
        let state = AppState::new(AppConfig::default());
        let mut events = state.catalog_sse().subscribe();

        state.update_degraded(false);
        state.update_degraded(false);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("system_status"));
        assert_eq!(event.data, r#"{"degraded":false}"#);
        assert!(events.try_recv().is_err());
    }
}
