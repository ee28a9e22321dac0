use std::collections::HashMap;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::enrich::{apply_corrections, PlaceCorrection};
use crate::state::AppState;
use crate::types::stats::Stats;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/enrich", post(enrich))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EnrichRequest {
    history_id: String,
    corrections: HashMap<String, PlaceCorrection>,
}

#[derive(Serialize)]
struct EnrichResponse {
    replaced: usize,
    stats: Stats,
}

async fn enrich(
    State(state): State<AppState>,
    Json(req): Json<EnrichRequest>,
) -> Result<Json<EnrichResponse>, AppError> {
    let (replaced, stats) = state
        .update(&req.history_id, |base| {
            let (events, replaced) = apply_corrections(base, &req.corrections);
            let stats = aggregate(&events);
            (events, (replaced, stats))
        })
        .ok_or_else(|| AppError::NotFound(req.history_id.clone()))?;

    tracing::info!(
        "Applied {} place corrections to {} ({} visits replaced)",
        req.corrections.len(),
        req.history_id,
        replaced
    );

    Ok(Json(EnrichResponse { replaced, stats }))
}
