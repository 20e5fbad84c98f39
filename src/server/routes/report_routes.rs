//! Report endpoints: listing, lookup, submission, update, deletion, and
//! rendered download.

use super::parse_body;
use crate::error::ApiError;
use crate::models::{
    CreateReportRequest, CreateReportResponse, Report, ReportStatus, ReportSummary, StatusMessage,
    UpdateReportRequest,
};
use crate::orchestrator::SubmitOutcome;
use crate::server::ServerAppState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pulldown_cmark::{html, Parser};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    /// Comma-separated report id filter.
    pub report_ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportSummary>,
}

/// GET /api/reports
pub async fn list_reports(
    State(state): State<ServerAppState>,
    Query(query): Query<ReportListQuery>,
) -> Json<ReportListResponse> {
    let ids: Option<Vec<String>> = query.report_ids.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    });

    let reports = state.reports.list(ids.as_deref());
    Json(ReportListResponse { reports })
}

/// GET /api/reports/:id
pub async fn get_report(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(state.orchestrator.get_status(&id)?))
}

/// POST /report/
pub async fn create_report(
    State(state): State<ServerAppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<CreateReportResponse>, ApiError> {
    let request: CreateReportRequest = parse_body(body)?;

    match state.orchestrator.submit(request).await? {
        SubmitOutcome::Accepted { research_id } => Ok(Json(CreateReportResponse {
            research_id,
            message: "report generation started".to_string(),
            report: None,
        })),
        SubmitOutcome::Completed { report } => Ok(Json(CreateReportResponse {
            research_id: report.id.clone(),
            message: format!("report generation {}", report.status),
            report: Some(report),
        })),
    }
}

/// PUT /api/reports/:id
pub async fn update_report(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Report>, ApiError> {
    let update: UpdateReportRequest = parse_body(body)?;

    if let Some(field) = update.forbidden_field() {
        return Err(ApiError::Forbidden(format!(
            "field '{}' cannot be updated",
            field
        )));
    }

    Ok(Json(state.reports.update_fields(&id, &update)?))
}

/// DELETE /api/reports/:id
pub async fn delete_report(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusMessage>, ApiError> {
    state.orchestrator.delete(&id)?;
    Ok(Json(StatusMessage::new(format!("report '{}' deleted", id))))
}

/// GET /report/:id — the completed report rendered to HTML.
pub async fn download_report(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let report = state.reports.get(&id)?;

    if report.status != ReportStatus::Completed {
        return Err(ApiError::NotReady(format!(
            "report '{}' is {}",
            id, report.status
        )));
    }

    let markdown = report.content.unwrap_or_default();
    let mut body = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut body, Parser::new(&markdown));

    let headers = [
        (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.html\"", id),
        ),
    ];

    Ok((headers, body).into_response())
}
