use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Why a document yielded no history. Only used for logging; callers see a
/// single message regardless of the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    InvalidJson(String),
    NoRecordArray,
    EmptyRecordArray,
    NoUsableEvents { records: usize },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::InvalidJson(err) => write!(f, "invalid JSON: {}", err),
            NotFoundReason::NoRecordArray => write!(f, "no record array located"),
            NotFoundReason::EmptyRecordArray => write!(f, "located record array is empty"),
            NotFoundReason::NoUsableEvents { records } => {
                write!(f, "none of {} records produced an event", records)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Could not find location history in this file")]
    NotFound(NotFoundReason),
}

impl ParseError {
    pub fn reason(&self) -> &NotFoundReason {
        match self {
            ParseError::NotFound(reason) => reason,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("History not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Parse(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
