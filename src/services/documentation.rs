use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the storefront backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::catalog::list_games,
        crate::routes::catalog::list_on_sale_games,
        crate::routes::catalog::list_games_by_platform,
        crate::routes::catalog::get_game,
        crate::routes::catalog::get_contact_link,
        crate::routes::catalog::get_game_image,
        crate::routes::catalog::get_catalog,
        crate::routes::auth::get_gate,
        crate::routes::auth::get_role,
        crate::routes::profile::get_profile,
        crate::routes::profile::save_profile,
        crate::routes::profile::get_user_profile,
        crate::routes::blobs::get_blob,
        crate::routes::sse::catalog_stream,
        crate::routes::admin::list_games,
        crate::routes::admin::create_game,
        crate::routes::admin::update_game,
        crate::routes::admin::request_delete,
        crate::routes::admin::delete_game,
        crate::routes::admin::assign_role,
    ),
    components(
        schemas(
            crate::dao::models::Platform,
            crate::dao::models::Principal,
            crate::dao::models::UserRole,
            crate::dto::health::HealthResponse,
            crate::dto::game::GameSummary,
            crate::dto::game::ContactLinkResponse,
            crate::dto::catalog::CatalogResponse,
            crate::dto::catalog::CatalogRow,
            crate::dto::catalog::CatalogStatus,
            crate::dto::admin::GameFormRequest,
            crate::dto::admin::PriceInput,
            crate::dto::admin::ImageInput,
            crate::dto::admin::DeleteConfirmationResponse,
            crate::dto::admin::AssignRoleRequest,
            crate::dto::auth::GateResponse,
            crate::dto::auth::CallerRoleResponse,
            crate::dto::auth::UserProfileDto,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::CatalogInvalidated,
            crate::dto::sse::CatalogChange,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Public game listings and the catalog view"),
        (name = "auth", description = "Caller identity and admin gate"),
        (name = "profile", description = "Self-service user profiles"),
        (name = "blobs", description = "Uploaded listing images"),
        (name = "admin", description = "Listing management restricted to admins"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
