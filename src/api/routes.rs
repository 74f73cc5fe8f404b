//! Route handlers: CSV export, download page, health, OpenAPI.

use crate::api::AppState;
use crate::error::Error;
use crate::pipeline;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

/// GET /users - Stream every record of the paged API as CSV
///
/// The response body starts flushing before the first page has been fetched
/// and grows as pages arrive. A mid-export failure terminates the body; rows
/// already sent are not retracted.
#[utoipa::path(
    get,
    path = "/users",
    tag = "export",
    responses(
        (status = 200, description = "CSV export, streamed incrementally as pages arrive", content_type = "text/csv"),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn users_csv(State(state): State<AppState>) -> Result<Response, Error> {
    tracing::info!(base_url = %state.config.source.base_url, "starting CSV export");
    let stream = pipeline::csv_stream(state.fetcher.clone(), &state.config);

    // These headers tell browsers to save the response to the filesystem.
    let disposition = format!("attachment; filename={}", state.config.csv.filename);
    Response::builder()
        .header(header::CONTENT_TYPE, "text/csv")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| Error::ApiServer(e.to_string()))
}

/// GET /users/download - Convenience page for triggering the export
#[utoipa::path(
    get,
    path = "/users/download",
    tag = "export",
    responses(
        (status = 200, description = "HTML page linking to the CSV export", content_type = "text/html")
    )
)]
pub async fn users_download_page() -> impl IntoResponse {
    Html(r#"<a href="/users">Download</a>"#)
}

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
