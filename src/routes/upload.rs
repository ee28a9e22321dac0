use axum::extract::Multipart;
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::parse::{self, NormalizeReport};
use crate::state::AppState;
use crate::types::stats::Stats;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/upload", post(upload))
}

#[derive(Serialize)]
struct UploadResponse {
    history_id: String,
    event_count: usize,
    report: NormalizeReport,
    stats: Stats,
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            file_bytes = Some(field.bytes().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read file bytes: {}", e))
            })?.to_vec());
        }
    }

    let bytes = file_bytes.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let filename = filename.ok_or_else(|| AppError::BadRequest("No filename provided".to_string()))?;

    if !is_json_filename(&filename) {
        return Err(AppError::BadRequest("Unsupported file format".to_string()));
    }

    tracing::info!("Parsing location history file: {} ({} bytes)", filename, bytes.len());

    let document = parse::parse_document(&bytes)?;
    let normalized = parse::normalize(&document)?;
    let stats = aggregate(&normalized.events);

    let history_id = Uuid::new_v4().to_string();
    let event_count = normalized.events.len();

    tracing::info!(
        "Uploaded {} as {} ({} events from {} records, {} km)",
        filename,
        history_id,
        event_count,
        normalized.report.records,
        stats.total_distance_km
    );

    state.insert(history_id.clone(), normalized.events);

    Ok(Json(UploadResponse {
        history_id,
        event_count,
        report: normalized.report,
        stats,
    }))
}

fn is_json_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
