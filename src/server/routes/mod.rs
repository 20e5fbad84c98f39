//! HTTP route modules, organized by domain:
//! - report_routes: report CRUD, submission, and download
//! - chat_routes: per-report transcripts and ad-hoc chat
//! - file_routes: document workspace listing, upload, and deletion

pub mod chat_routes;
pub mod file_routes;
pub mod report_routes;

use super::ServerAppState;
use crate::error::ApiError;
use axum::routing::{delete, get, post};
use axum::Router;

/// Deserialize a request body that arrived as loose JSON into a closed
/// request type, mapping failures (missing fields, unknown fields,
/// out-of-enumeration values) to `InvalidRequest`.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

/// Assemble the full API surface.
pub fn api_router() -> Router<ServerAppState> {
    Router::new()
        .route("/", get(super::health_handler))
        .route("/api/reports", get(report_routes::list_reports))
        .route(
            "/api/reports/:id",
            get(report_routes::get_report)
                .put(report_routes::update_report)
                .delete(report_routes::delete_report),
        )
        .route("/report/", post(report_routes::create_report))
        .route("/report/:id", get(report_routes::download_report))
        .route(
            "/api/reports/:id/chat",
            get(chat_routes::get_transcript).post(chat_routes::post_turn),
        )
        .route("/api/chat", post(chat_routes::adhoc_chat))
        .route("/files/", get(file_routes::list_files))
        .route("/files/:name", delete(file_routes::delete_file))
        .route("/upload/", post(file_routes::upload_file))
}
