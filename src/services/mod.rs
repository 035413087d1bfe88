/// Admin panel operations on listings.
pub mod admin_service;
/// Caller roles and the admin gate.
pub mod auth_service;
/// Catalog view rendering.
pub mod catalog_service;
/// Purchase enquiry deep links.
pub mod contact_link;
/// Cached reads and invalidating mutations over the record store.
pub mod data_access;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Listing image dereferencing.
pub mod image_service;
/// Self-service profiles.
pub mod profile_service;
/// Server-Sent Events streaming.
pub mod sse_service;
/// Record store connection supervisor.
pub mod storage_supervisor;
