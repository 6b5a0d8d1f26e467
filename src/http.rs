//! HTTP surface - admin upload endpoints and health check

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::validate_session;
use crate::error::AppError;
use crate::import::insert::run_import;
use crate::import::row::{rows_from_csv, rows_from_json, rows_from_xlsx_workbook};
use crate::import::types::ImportSummary;
use crate::store::ImportStore;

/// Uploads can carry full listing exports with image URLs.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ImportStore>,
}

#[derive(Serialize, Deserialize)]
struct ApiResponse {
    message: String,
    status: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/admin/import/csv", post(import_csv))
        .route("/api/admin/import/xlsx", post(import_xlsx))
        .route("/api/admin/import/xlsx-file", post(import_xlsx_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Elbtal import API is running!".to_string(),
        status: "ok".to_string(),
    })
}

/// Multipart CSV upload: fields `file` (text/csv listing export) and
/// `token` (admin session).
async fn import_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let mut file: Option<String> = None;
    let mut token = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                file = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            Some("token") => {
                token = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    validate_session(state.store.as_ref(), &token).await?;

    info!("CSV import upload received ({} bytes)", file.len());
    let outcomes = rows_from_csv(&file);
    let summary = run_import(state.store.as_ref(), outcomes).await;
    Ok(Json(summary))
}

/// JSON body for XLSX imports converted client-side: every element of
/// `properties` maps column headers to cell values.
#[derive(Debug, Deserialize)]
struct XlsxImportRequest {
    #[serde(default)]
    properties: Vec<serde_json::Value>,
    #[serde(default)]
    token: String,
}

async fn import_xlsx(
    State(state): State<AppState>,
    Json(body): Json<XlsxImportRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    if body.properties.is_empty() {
        return Err(AppError::BadRequest("No rows provided".to_string()));
    }
    validate_session(state.store.as_ref(), &body.token).await?;

    info!("XLSX import request with {} rows", body.properties.len());
    let outcomes = rows_from_json(&body.properties);
    let summary = run_import(state.store.as_ref(), outcomes).await;
    Ok(Json(summary))
}

/// Multipart upload of a raw `.xlsx` workbook; the first sheet's header
/// row supplies the field names.
async fn import_xlsx_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let mut file: Option<bytes::Bytes> = None;
    let mut token = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            Some("token") => {
                token = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    validate_session(state.store.as_ref(), &token).await?;

    info!("XLSX workbook upload received ({} bytes)", file.len());
    let outcomes = rows_from_xlsx_workbook(&file).map_err(AppError::Internal)?;
    let summary = run_import(state.store.as_ref(), outcomes).await;
    Ok(Json(summary))
}
