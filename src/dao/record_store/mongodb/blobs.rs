//! Uploaded images kept in a `blobs` collection of the record store database, so image URLs
//! stay valid across restarts.

use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{
    Collection,
    bson::{Binary, spec::BinarySubtype},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{
    error::{MongoDaoError, MongoResult},
    models::doc_id,
    store::MongoRecordStore,
};
use crate::dao::{
    blob::{BlobRef, sniff_content_type},
    blob_store::{BlobStore, StoredBlob},
    models::ImageRef,
    storage::StorageResult,
};

const BLOB_COLLECTION_NAME: &str = "blobs";

#[derive(Debug, Serialize, Deserialize)]
struct MongoBlobDocument {
    #[serde(rename = "_id")]
    id: String,
    data: Binary,
}

/// Blob store sharing the record store's connection.
#[derive(Clone)]
pub struct MongoBlobStore {
    records: MongoRecordStore,
    base_url: Arc<str>,
}

impl MongoBlobStore {
    /// Store uploads through `records`, addressing them as `<base_url>/<id>`.
    pub fn new(records: MongoRecordStore, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            records,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    async fn blobs(&self) -> Collection<MongoBlobDocument> {
        self.records
            .database()
            .await
            .collection::<MongoBlobDocument>(BLOB_COLLECTION_NAME)
    }

    async fn insert(&self, id: String, data: &[u8]) -> MongoResult<()> {
        let document = MongoBlobDocument {
            id: id.clone(),
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes: data.to_vec(),
            },
        };
        self.blobs()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveBlob { id, source })?;
        Ok(())
    }

    async fn find(&self, id: String) -> MongoResult<Option<StoredBlob>> {
        let document = self
            .blobs()
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::LoadBlob {
                id: id.clone(),
                source,
            })?;
        Ok(document.map(|document| StoredBlob {
            content_type: sniff_content_type(&document.data.bytes),
            data: Arc::from(document.data.bytes),
        }))
    }

    async fn delete(&self, id: String) -> MongoResult<bool> {
        let result = self
            .blobs()
            .await
            .delete_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::DeleteBlob {
                id: id.clone(),
                source,
            })?;
        Ok(result.deleted_count > 0)
    }
}

impl BlobStore for MongoBlobStore {
    fn upload(&self, blob: BlobRef) -> BoxFuture<'static, StorageResult<ImageRef>> {
        let store = self.clone();
        Box::pin(async move {
            let data = match &blob {
                BlobRef::Url(url) => return Ok(ImageRef { url: url.clone() }),
                BlobRef::Bytes { data, .. } => data.clone(),
            };

            blob.report_progress(0);
            let id = Uuid::new_v4().simple().to_string();
            store.insert(id.clone(), &data).await?;
            blob.report_progress(100);
            debug!(%id, bytes = data.len(), "stored blob in MongoDB");

            Ok(ImageRef {
                url: format!("{}/{}", store.base_url, id),
            })
        })
    }

    fn fetch(&self, id: String) -> BoxFuture<'static, StorageResult<Option<StoredBlob>>> {
        let store = self.clone();
        Box::pin(async move { store.find(id).await.map_err(Into::into) })
    }

    fn remove(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(id).await.map_err(Into::into) })
    }
}
