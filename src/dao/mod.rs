/// Blob references with byte-backed and URL-backed variants.
pub mod blob;
/// Upload/serve capability for blob content.
pub mod blob_store;
/// Persisted record definitions.
pub mod models;
/// Record store abstraction and its backends.
pub mod record_store;
/// Backend-agnostic storage errors.
pub mod storage;
