use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::debug;
use uuid::Uuid;

use super::{BlobStore, StoredBlob};
use crate::dao::{
    blob::{BlobRef, sniff_content_type},
    models::ImageRef,
    storage::StorageResult,
};

const CHUNK_SIZE: usize = 64 * 1024;

/// Keeps uploaded blobs in memory and exposes them below `base_url`.
#[derive(Clone)]
pub struct MemoryBlobStore {
    base_url: Arc<str>,
    blobs: Arc<DashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    /// Create a store whose uploads are addressed as `<base_url>/<id>`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            blobs: Arc::new(DashMap::new()),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn upload(&self, blob: BlobRef) -> BoxFuture<'static, StorageResult<ImageRef>> {
        let store = self.clone();
        Box::pin(async move {
            let data = match &blob {
                BlobRef::Url(url) => return Ok(ImageRef { url: url.clone() }),
                BlobRef::Bytes { data, .. } => data.clone(),
            };

            let total = data.len();
            let mut copied = Vec::with_capacity(total);
            for chunk in data.chunks(CHUNK_SIZE) {
                copied.extend_from_slice(chunk);
                let percentage = (copied.len() * 100 / total) as u8;
                blob.report_progress(percentage);
                tokio::task::yield_now().await;
            }
            if total == 0 {
                blob.report_progress(100);
            }

            let id = Uuid::new_v4().simple().to_string();
            let stored = StoredBlob {
                content_type: sniff_content_type(&copied),
                data: Arc::from(copied),
            };
            debug!(%id, bytes = total, content_type = stored.content_type, "stored blob");
            store.blobs.insert(id.clone(), stored);

            Ok(ImageRef {
                url: format!("{}/{}", store.base_url, id),
            })
        })
    }

    fn fetch(&self, id: String) -> BoxFuture<'static, StorageResult<Option<StoredBlob>>> {
        let blob = self.blobs.get(&id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(blob) })
    }

    fn remove(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let removed = self.blobs.remove(&id).is_some();
        if removed {
            debug!(%id, "removed blob");
        }
        Box::pin(async move { Ok(removed) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn upload_reports_increasing_progress_up_to_completion() {
        let store = MemoryBlobStore::new("/blobs/");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let blob = BlobRef::from_bytes(vec![0u8; CHUNK_SIZE * 3 + 10])
            .with_upload_progress(move |pct| sink.lock().unwrap().push(pct));

        let image = store.upload(blob).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(seen.last(), Some(&100));

        let id = image.url.strip_prefix("/blobs/").unwrap().to_string();
        let stored = store.fetch(id).await.unwrap().unwrap();
        assert_eq!(stored.data.len(), CHUNK_SIZE * 3 + 10);
    }

    #[tokio::test]
    async fn url_backed_blobs_are_not_uploaded() {
        let store = MemoryBlobStore::new("/blobs");
        let image = store
            .upload(BlobRef::from_url("https://cdn.example.com/x.png"))
            .await
            .unwrap();
        assert_eq!(image.url, "https://cdn.example.com/x.png");
        assert!(store.blobs.is_empty());
    }

    #[tokio::test]
    async fn empty_upload_still_completes() {
        let store = MemoryBlobStore::new("/blobs");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let blob = BlobRef::from_bytes(Vec::new())
            .with_upload_progress(move |pct| sink.lock().unwrap().push(pct));

        store.upload(blob).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn unknown_ids_fetch_nothing() {
        let store = MemoryBlobStore::new("/blobs");
        assert!(store.fetch("missing".into()).await.unwrap().is_none());
        assert!(!store.remove("missing".into()).await.unwrap());
    }

    #[tokio::test]
    async fn removed_blobs_are_gone() {
        let store = MemoryBlobStore::new("/blobs");
        let image = store.upload(BlobRef::from_bytes(vec![1, 2])).await.unwrap();
        let id = image.url.trim_start_matches("/blobs/").to_owned();

        assert!(store.remove(id.clone()).await.unwrap());
        assert!(store.fetch(id).await.unwrap().is_none());
        assert!(store.blobs.is_empty());
    }
}
