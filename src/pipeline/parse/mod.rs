//! Location history normalizer.
//!
//! Turns an export document of unknown dialect into time-ordered [`Event`]s:
//! locate the record array, classify each record, convert it, then sort.

pub mod fields;
pub mod locate;
pub mod record;

use serde::Serialize;
use serde_json::Value;

use crate::error::{NotFoundReason, ParseError};
use crate::types::event::Event;
use locate::RecordSource;
use record::Rejection;

/// Per-parse diagnostics. Never affects which events are returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub source: RecordSource,
    pub records: usize,
    pub events: usize,
    pub unrecognized: usize,
    pub decimated: usize,
    pub invalid_timestamp: usize,
    pub missing_coordinates: usize,
    pub zero_coordinates: usize,
}

impl NormalizeReport {
    fn new(source: RecordSource, records: usize) -> Self {
        Self {
            source,
            records,
            events: 0,
            unrecognized: 0,
            decimated: 0,
            invalid_timestamp: 0,
            missing_coordinates: 0,
            zero_coordinates: 0,
        }
    }

    fn reject(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::InvalidTimestamp => self.invalid_timestamp += 1,
            Rejection::MissingCoordinates => self.missing_coordinates += 1,
            Rejection::ZeroCoordinates => self.zero_coordinates += 1,
            Rejection::Decimated => self.decimated += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedHistory {
    pub events: Vec<Event>,
    pub report: NormalizeReport,
}

/// Reads an export file. Malformed JSON is reported the same way as a
/// document without history.
pub fn parse_document(bytes: &[u8]) -> Result<Value, ParseError> {
    serde_json::from_slice(bytes).map_err(|e| {
        let reason = NotFoundReason::InvalidJson(e.to_string());
        tracing::warn!("Rejected upload: {}", reason);
        ParseError::NotFound(reason)
    })
}

/// Normalizes a document into events sorted by start time. All-or-nothing:
/// a document with no usable records fails with [`ParseError::NotFound`].
pub fn normalize(document: &Value) -> Result<NormalizedHistory, ParseError> {
    let located = locate::locate(document).map_err(|reason| {
        tracing::warn!("No location history: {}", reason);
        ParseError::NotFound(reason)
    })?;

    let mut report = NormalizeReport::new(located.source, located.records.len());
    let mut events = Vec::new();

    for (index, value) in located.records.iter().enumerate() {
        let Some(shape) = record::classify(value) else {
            report.unrecognized += 1;
            continue;
        };

        for outcome in record::convert(index, shape) {
            match outcome {
                Ok(event) => events.push(event),
                Err(rejection) => {
                    if rejection != Rejection::Decimated {
                        tracing::debug!("Dropped {} record {}: {:?}", shape.name(), index, rejection);
                    }
                    report.reject(rejection);
                }
            }
        }
    }

    if events.is_empty() {
        let reason = NotFoundReason::NoUsableEvents {
            records: report.records,
        };
        tracing::warn!("No location history: {}", reason);
        return Err(ParseError::NotFound(reason));
    }

    events.sort_by_key(|event| event.start_time);
    report.events = events.len();

    tracing::debug!("Normalized history: {:?}", report);

    Ok(NormalizedHistory { events, report })
}
