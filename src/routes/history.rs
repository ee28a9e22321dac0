use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::filter::EventFilter;
use crate::pipeline::grounding;
use crate::state::AppState;
use crate::types::event::Event;
use crate::types::stats::Stats;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", post(events))
        .route("/api/stats", post(stats))
        .route("/api/context", post(context))
}

#[derive(Deserialize)]
struct HistoryQuery {
    history_id: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(flatten)]
    filter: EventFilter,
}

#[derive(Serialize)]
struct EventsResponse {
    event_count: usize,
    events: Vec<Event>,
}

#[derive(Serialize)]
struct StatsResponse {
    event_count: usize,
    stats: Stats,
}

#[derive(Serialize)]
struct ContextResponse {
    visit_log: String,
    summary: String,
}

fn load(state: &AppState, history_id: &str) -> Result<Arc<Vec<Event>>, AppError> {
    state
        .get(history_id)
        .ok_or_else(|| AppError::NotFound(history_id.to_string()))
}

async fn events(
    State(state): State<AppState>,
    Json(query): Json<HistoryQuery>,
) -> Result<Json<EventsResponse>, AppError> {
    let base = load(&state, &query.history_id)?;
    let mut events = query.filter.apply(&base);
    let event_count = events.len();
    if let Some(limit) = query.limit {
        events.truncate(limit);
    }

    Ok(Json(EventsResponse {
        event_count,
        events,
    }))
}

async fn stats(
    State(state): State<AppState>,
    Json(query): Json<HistoryQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let base = load(&state, &query.history_id)?;
    let events = query.filter.apply(&base);

    tracing::debug!(
        "Aggregating {} of {} events for {}",
        events.len(),
        base.len(),
        query.history_id
    );

    Ok(Json(StatsResponse {
        event_count: events.len(),
        stats: aggregate(&events),
    }))
}

async fn context(
    State(state): State<AppState>,
    Json(query): Json<HistoryQuery>,
) -> Result<Json<ContextResponse>, AppError> {
    let base = load(&state, &query.history_id)?;
    let events = query.filter.apply(&base);
    let limit = query
        .limit
        .unwrap_or(state.config.grounding_visit_limit)
        .min(state.config.grounding_visit_limit);

    Ok(Json(ContextResponse {
        visit_log: grounding::visit_log(&events, limit),
        summary: grounding::summarize(&aggregate(&events)),
    }))
}
