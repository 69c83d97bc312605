use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::MAX_UPLOAD_BYTES,
    error::AppError,
    models::{ColumnReport, DatasetFormat, LoadedDataset},
    services::dataset::{loader, preview, report},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/datasets/:format", post(upload_dataset))
        .route("/reports", post(generate_column_report))
        .route("/reports/export", get(export_report))
        // The loader enforces the real cap and reports it as its own error;
        // axum's default 2 MB body limit just needs to stay out of the way.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024))
}

#[derive(Debug, Serialize)]
pub struct ColumnPreview {
    name: String,
    data_type: String,
    sample_values: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    format: String,
    row_count: usize,
    column_count: usize,
    sample_rows: Vec<Vec<String>>,
    columns: Vec<ColumnPreview>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    column: String,
}

#[axum::debug_handler]
async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    Path(format): Path<String>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let format: DatasetFormat = format.parse()?;

    let start = std::time::Instant::now();
    tracing::info!("received {} upload, size: {}KB", format, body.len() / 1024);

    let df = match loader::load(&body, format, state.config.max_upload_bytes) {
        Ok(df) => df,
        Err(e) => {
            // No partial state: a failed upload clears whatever was loaded.
            let mut session = state.session.lock();
            session.dataset = None;
            session.last_report = None;
            return Err(e);
        }
    };

    let summary = preview::summarize(&df)?;
    tracing::info!(
        "loaded {} dataset with {} rows and {} columns in {:?}",
        format,
        summary.row_count,
        summary.column_count,
        start.elapsed()
    );

    let response = UploadResponse {
        format: format.to_string(),
        row_count: summary.row_count,
        column_count: summary.column_count,
        sample_rows: summary.sample_rows,
        columns: summary
            .columns
            .into_iter()
            .map(|col| ColumnPreview {
                name: col.name,
                data_type: col.data_type,
                sample_values: col.sample_values.to_vec(),
            })
            .collect(),
    };

    let mut session = state.session.lock();
    session.dataset = Some(LoadedDataset { format, frame: df });
    session.last_report = None;

    Ok(Json(response))
}

#[axum::debug_handler]
async fn generate_column_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ColumnReport>, AppError> {
    let start = std::time::Instant::now();
    let mut session = state.session.lock();

    let Some(dataset) = session.dataset.as_ref() else {
        return Err(AppError::InvalidInput(
            "no dataset loaded; upload a CSV or JSON file first".to_string(),
        ));
    };

    match report::generate_report(&dataset.frame, &request.column) {
        Ok(report) => {
            tracing::info!(
                "column report for '{}' generated in {:?}",
                request.column,
                start.elapsed()
            );
            session.last_report = Some(report.clone());
            Ok(Json(report))
        }
        Err(e) => {
            session.last_report = None;
            Err(e)
        }
    }
}

#[axum::debug_handler]
async fn export_report(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.session.lock();

    let Some(report) = session.last_report.as_ref() else {
        return Err(AppError::InvalidInput(
            "no column report available; generate one first".to_string(),
        ));
    };

    let markdown = report.to_markdown();
    let disposition = format!("attachment; filename=\"{}\"", report.export_file_name());

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        markdown,
    ))
}
