/// In-memory blob store serving uploads from this process.
pub mod memory;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::dao::{blob::BlobRef, models::ImageRef, storage::StorageResult};

/// Content previously uploaded to a [`BlobStore`].
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// MIME type detected at upload time.
    pub content_type: &'static str,
    /// Raw content.
    pub data: Arc<[u8]>,
}

/// Storage collaborator turning byte-backed blobs into URL-backed references.
pub trait BlobStore: Send + Sync {
    /// Upload byte-backed content, reporting progress through the blob's observer.
    /// URL-backed blobs are returned as-is without uploading.
    fn upload(&self, blob: BlobRef) -> BoxFuture<'static, StorageResult<ImageRef>>;
    /// Fetch content previously uploaded under `id`.
    fn fetch(&self, id: String) -> BoxFuture<'static, StorageResult<Option<StoredBlob>>>;
    /// Drop content uploaded under `id`; `false` when there was none.
    fn remove(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;
}

/// Blob id of `url` when it points below `base_url`, i.e. was produced by a blob store upload.
pub fn blob_id<'a>(base_url: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(base_url.trim_end_matches('/'))?
        .strip_prefix('/')
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_urls_below_the_base_carry_a_blob_id() {
        assert_eq!(blob_id("/blobs", "/blobs/abc"), Some("abc"));
        assert_eq!(blob_id("/blobs/", "/blobs/abc"), Some("abc"));
        assert_eq!(blob_id("/blobs", "/blobsabc"), None);
        assert_eq!(blob_id("/blobs", "/blobs/"), None);
        assert_eq!(blob_id("/blobs", "https://cdn.example.com/blobs/abc"), None);
    }
}
