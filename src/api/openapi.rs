//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the pagestream REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the pagestream REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pagestream REST API",
        version = "0.1.0",
        description = "Streaming CSV export of a paginated JSON API",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        // Export
        crate::api::routes::users_csv,
        crate::api::routes::users_download_page,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "export", description = "CSV export - Stream records from the paged API as CSV"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
