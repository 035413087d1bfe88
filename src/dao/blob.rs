//! Opaque handles to binary content such as cover images.

use std::{fmt, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

use crate::dao::models::ImageRef;

/// Callback receiving upload progress as a percentage in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Failures while dereferencing a blob to its bytes.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The URL is not absolute and cannot be fetched directly.
    #[error("blob URL `{url}` is not an absolute http(s) URL")]
    InvalidUrl {
        /// Offending URL.
        url: String,
    },
    /// The HTTP request could not be completed.
    #[error("failed to fetch blob from `{url}`")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The remote answered with a non-success status.
    #[error("unexpected status {status} fetching blob from `{url}`")]
    Status {
        /// Requested URL.
        url: String,
        /// Status returned by the remote.
        status: reqwest::StatusCode,
    },
    /// The remote body exceeds the accepted size.
    #[error("blob at `{url}` is larger than {limit} bytes")]
    TooLarge {
        /// Requested URL.
        url: String,
        /// Accepted size, in bytes.
        limit: u64,
    },
}

/// Handle to binary content, either held in memory or reachable by URL.
#[derive(Clone)]
pub enum BlobRef {
    /// Raw bytes not uploaded yet, optionally carrying an upload progress observer.
    Bytes {
        /// Content.
        data: Arc<[u8]>,
        /// Observer invoked by the blob store while uploading.
        on_progress: Option<ProgressFn>,
    },
    /// Content already reachable at a URL.
    Url(String),
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobRef::Bytes { data, on_progress } => f
                .debug_struct("Bytes")
                .field("len", &data.len())
                .field("tracks_progress", &on_progress.is_some())
                .finish(),
            BlobRef::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

impl BlobRef {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        BlobRef::Bytes {
            data: Arc::from(bytes.into()),
            on_progress: None,
        }
    }

    /// Reference content that already lives at `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        BlobRef::Url(url.into())
    }

    /// Attach an upload progress observer. URL-backed blobs never upload, so they ignore it.
    pub fn with_upload_progress<F>(self, on_progress: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        match self {
            BlobRef::Bytes { data, .. } => BlobRef::Bytes {
                data,
                on_progress: Some(Arc::new(on_progress)),
            },
            url @ BlobRef::Url(_) => url,
        }
    }

    /// A URL that can be used directly, e.g. as an `<img src>`.
    ///
    /// Byte-backed blobs are rendered as a base64 `data:` URL.
    pub fn direct_url(&self) -> String {
        match self {
            BlobRef::Bytes { data, .. } => format!(
                "data:{};base64,{}",
                sniff_content_type(data),
                STANDARD.encode(data)
            ),
            BlobRef::Url(url) => url.clone(),
        }
    }

    /// Resolve the content, fetching it over HTTP for URL-backed blobs.
    ///
    /// Remote bodies are streamed and abandoned once they exceed `max_bytes`.
    pub async fn get_bytes(
        &self,
        http: &reqwest::Client,
        max_bytes: u64,
    ) -> Result<Vec<u8>, BlobError> {
        let url = match self {
            BlobRef::Bytes { data, .. } => return Ok(data.to_vec()),
            BlobRef::Url(url) => url,
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(BlobError::InvalidUrl { url: url.clone() });
        }

        let fetch_error = |source: reqwest::Error| BlobError::Fetch {
            url: url.clone(),
            source,
        };
        let too_large = || BlobError::TooLarge {
            url: url.clone(),
            limit: max_bytes,
        };

        let mut response = http.get(url).send().await.map_err(fetch_error)?;

        if !response.status().is_success() {
            return Err(BlobError::Status {
                url: url.clone(),
                status: response.status(),
            });
        }
        if response
            .content_length()
            .is_some_and(|length| length > max_bytes)
        {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
            if (bytes.len() + chunk.len()) as u64 > max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    /// Notify the attached observer, if any.
    pub fn report_progress(&self, percentage: u8) {
        if let BlobRef::Bytes {
            on_progress: Some(callback),
            ..
        } = self
        {
            callback(percentage.min(100));
        }
    }
}

impl From<ImageRef> for BlobRef {
    fn from(value: ImageRef) -> Self {
        BlobRef::Url(value.url)
    }
}

/// Best-effort MIME type detection for the image formats the storefront accepts.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
