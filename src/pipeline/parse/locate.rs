use serde::Serialize;
use serde_json::Value;

use crate::error::NotFoundReason;

/// Top-level keys checked before falling back to a search, newest dialect first.
pub const KNOWN_KEYS: [&str; 5] = [
    "semanticSegments",
    "rawSignals",
    "timelineObjects",
    "locations",
    "features",
];

const MAX_SEARCH_DEPTH: usize = 5;

/// Keys whose presence marks an array element as a location-bearing record.
const MARKER_KEYS: [&str; 16] = [
    "latitudeE7",
    "latE7",
    "centerLatE7",
    "latitude",
    "lat",
    "visit",
    "placeVisit",
    "activity",
    "activitySegment",
    "timelinePath",
    "position",
    "latLng",
    "LatLng",
    "point",
    "coordinates",
    "geometry",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RecordSource {
    Root,
    Key { key: String },
    Search { score: usize },
}

#[derive(Debug)]
pub struct Located<'a> {
    pub records: &'a [Value],
    pub source: RecordSource,
}

pub fn locate(document: &Value) -> Result<Located<'_>, NotFoundReason> {
    let located = match document {
        Value::Array(items) => Located {
            records: items,
            source: RecordSource::Root,
        },
        Value::Object(map) => {
            let known = KNOWN_KEYS.iter().find_map(|key| match map.get(*key) {
                Some(Value::Array(items)) if !items.is_empty() => Some(Located {
                    records: items,
                    source: RecordSource::Key {
                        key: key.to_string(),
                    },
                }),
                _ => None,
            });

            match known {
                Some(located) => located,
                None => {
                    let mut best = None;
                    search(document, 0, &mut best);
                    let (records, score) = best.ok_or(NotFoundReason::NoRecordArray)?;
                    Located {
                        records,
                        source: RecordSource::Search { score },
                    }
                }
            }
        }
        _ => return Err(NotFoundReason::NoRecordArray),
    };

    if located.records.is_empty() {
        return Err(NotFoundReason::EmptyRecordArray);
    }

    tracing::debug!(
        "Located {} records via {:?}",
        located.records.len(),
        located.source
    );

    Ok(located)
}

/// Depth-bounded walk keeping the array with the most location-bearing
/// elements. The first array reaching a given score wins ties. Only arrays
/// scoring zero are descended into, so paths nested inside records never
/// compete with the records themselves.
fn search<'a>(value: &'a Value, depth: usize, best: &mut Option<(&'a [Value], usize)>) {
    match value {
        Value::Array(items) => {
            let score = score_records(items);
            let best_score = best.as_ref().map(|(_, s)| *s).unwrap_or(0);
            if score > best_score {
                *best = Some((items.as_slice(), score));
            }
            if score == 0 && depth < MAX_SEARCH_DEPTH {
                for item in items {
                    search(item, depth + 1, best);
                }
            }
        }
        Value::Object(map) if depth < MAX_SEARCH_DEPTH => {
            for child in map.values() {
                search(child, depth + 1, best);
            }
        }
        _ => {}
    }
}

pub fn score_records(items: &[Value]) -> usize {
    items
        .iter()
        .filter(|item| {
            item.as_object()
                .map(|obj| MARKER_KEYS.iter().any(|key| obj.contains_key(*key)))
                .unwrap_or(false)
        })
        .count()
}
