use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use crate::pipeline::parse::fields::{
    coerce_number, extract_city, format_activity_type, haversine_meters, resolve_lat_lng,
    resolve_location, text_at, timestamp_at, title_case,
};
use crate::types::event::{Event, EventKind};

/// Keep every Nth point of a semantic timeline path.
pub const PATH_STRIDE: usize = 5;
/// Keep every Nth raw signal / legacy sample, by index in the record array.
pub const SIGNAL_STRIDE: usize = 50;

const DEFAULT_VISIT_TITLE: &str = "Unknown Place";
const DEFAULT_VISIT_SUBTITLE: &str = "Address unavailable";
const DEFAULT_MOVE_TITLE: &str = "Travel";

const LEGACY_START_KEYS: [&str; 3] = ["startTimestamp", "startTimestampMs", "startTime"];
const LEGACY_END_KEYS: [&str; 3] = ["endTimestamp", "endTimestampMs", "endTime"];

type Object = Map<String, Value>;

/// The record dialects, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordShape<'a> {
    SemanticVisit { record: &'a Object, visit: &'a Object },
    SemanticActivity { record: &'a Object, activity: &'a Object },
    SemanticPath { record: &'a Object, path: &'a [Value] },
    RawSignal { record: &'a Object, position: &'a Object },
    LegacyVisit { visit: &'a Object },
    LegacyActivity { activity: &'a Object },
    LegacySample { record: &'a Object },
}

impl RecordShape<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            RecordShape::SemanticVisit { .. } => "semantic_visit",
            RecordShape::SemanticActivity { .. } => "semantic_activity",
            RecordShape::SemanticPath { .. } => "semantic_path",
            RecordShape::RawSignal { .. } => "raw_signal",
            RecordShape::LegacyVisit { .. } => "legacy_visit",
            RecordShape::LegacyActivity { .. } => "legacy_activity",
            RecordShape::LegacySample { .. } => "legacy_sample",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidTimestamp,
    MissingCoordinates,
    ZeroCoordinates,
    Decimated,
}

/// First matching shape wins; `None` means the record is not history.
pub fn classify(record: &Value) -> Option<RecordShape<'_>> {
    let record = record.as_object()?;

    if record.contains_key("startTime") {
        if let Some(visit) = object_at(record, "visit") {
            return Some(RecordShape::SemanticVisit { record, visit });
        }
        if let Some(activity) = object_at(record, "activity") {
            return Some(RecordShape::SemanticActivity { record, activity });
        }
        if let Some(path) = record.get("timelinePath").and_then(Value::as_array) {
            return Some(RecordShape::SemanticPath { record, path });
        }
    }

    if let Some(position) = object_at(record, "position") {
        let has_coords = ["LatLng", "latLng"]
            .iter()
            .any(|key| position.get(*key).map(Value::is_string).unwrap_or(false));
        let has_time = position.contains_key("timestamp") || record.contains_key("timestamp");
        if has_coords && has_time {
            return Some(RecordShape::RawSignal { record, position });
        }
    }

    if let Some(visit) = first_object(record, &["placeVisit", "visit"]) {
        return Some(RecordShape::LegacyVisit { visit });
    }
    if let Some(activity) = first_object(record, &["activitySegment", "activity"]) {
        return Some(RecordShape::LegacyActivity { activity });
    }

    let has_lat = ["latitudeE7", "latitude"].iter().any(|key| record.contains_key(*key));
    let has_time = ["timestamp", "timestampMs"]
        .iter()
        .any(|key| record.contains_key(*key));
    if has_lat && has_time {
        return Some(RecordShape::LegacySample { record });
    }

    None
}

/// Converts a classified record found at `index` of the record array.
/// Semantic paths yield one outcome per kept point; every other shape yields one.
pub fn convert(index: usize, shape: RecordShape<'_>) -> Vec<Result<Event, Rejection>> {
    match shape {
        RecordShape::SemanticVisit { record, visit } => vec![semantic_visit(index, record, visit)],
        RecordShape::SemanticActivity { record, activity } => {
            vec![semantic_activity(index, record, activity)]
        }
        RecordShape::SemanticPath { record, path } => semantic_path(index, record, path),
        RecordShape::RawSignal { record, position } => vec![raw_signal(index, record, position)],
        RecordShape::LegacyVisit { visit } => vec![legacy_visit(index, visit)],
        RecordShape::LegacyActivity { activity } => vec![legacy_activity(index, activity)],
        RecordShape::LegacySample { record } => vec![legacy_sample(index, record)],
    }
}

fn semantic_visit(index: usize, record: &Object, visit: &Object) -> Result<Event, Rejection> {
    let (start, end) = segment_times(record)?;
    let place = describe_place(visit);
    let coords = place.coords.ok_or(Rejection::MissingCoordinates)?;
    Ok(visit_event(format!("visit-{}", index), &place, coords, start, end))
}

fn semantic_activity(index: usize, record: &Object, activity: &Object) -> Result<Event, Rejection> {
    let (start, end) = segment_times(record)?;
    let from = activity.get("start").and_then(resolve_location);
    let to = activity.get("end").and_then(resolve_location);
    let coords = from.or(to).ok_or(Rejection::MissingCoordinates)?;

    let reported = activity.get("distanceMeters").and_then(coerce_number);
    let raw_type = object_at(activity, "topCandidate").and_then(|c| text_at(c, "type"));

    Ok(move_event(
        format!("activity-{}", index),
        coords,
        travel_distance(reported, from, to),
        raw_type,
        start,
        end,
    ))
}

fn semantic_path(index: usize, record: &Object, path: &[Value]) -> Vec<Result<Event, Rejection>> {
    let segment_start = timestamp_at(record, &["startTime"]);

    path.iter()
        .enumerate()
        .step_by(PATH_STRIDE)
        .map(|(offset, point)| {
            let sample = point.as_object();
            let time = sample
                .and_then(|p| timestamp_at(p, &["time", "timestamp"]))
                .or_else(|| {
                    let minutes = sample
                        .and_then(|p| p.get("durationMinutesOffsetFromStartTime"))
                        .and_then(coerce_number)?;
                    let delta = Duration::try_minutes(minutes as i64)?;
                    segment_start?.checked_add_signed(delta)
                })
                .or(segment_start)
                .ok_or(Rejection::InvalidTimestamp)?;
            let coords = resolve_location(point).ok_or(Rejection::MissingCoordinates)?;

            Ok(point_event(
                format!("path-{}-{}", index, offset),
                "Path Point",
                "Timeline path".to_string(),
                coords,
                time,
            ))
        })
        .collect()
}

fn raw_signal(index: usize, record: &Object, position: &Object) -> Result<Event, Rejection> {
    if index % SIGNAL_STRIDE != 0 {
        return Err(Rejection::Decimated);
    }

    let time = timestamp_at(position, &["timestamp"])
        .or_else(|| timestamp_at(record, &["timestamp"]))
        .ok_or(Rejection::InvalidTimestamp)?;
    let coords = resolve_lat_lng(position).ok_or(Rejection::MissingCoordinates)?;
    let source = text_at(position, "source")
        .map(title_case)
        .unwrap_or_else(|| "Raw signal".to_string());

    Ok(point_event(format!("signal-{}", index), "Location Sample", source, coords, time))
}

fn legacy_visit(index: usize, visit: &Object) -> Result<Event, Rejection> {
    let (start, end) = legacy_times(visit)?;
    let place = describe_place(visit);
    let coords = place.coords.ok_or(Rejection::MissingCoordinates)?;
    let coords = non_zero(coords)?;
    Ok(visit_event(format!("place-visit-{}", index), &place, coords, start, end))
}

fn legacy_activity(index: usize, activity: &Object) -> Result<Event, Rejection> {
    let (start, end) = legacy_times(activity)?;
    let from = first_location(activity, &["startLocation", "start"]);
    let to = first_location(activity, &["endLocation", "end"]);
    let coords = from.or(to).ok_or(Rejection::MissingCoordinates)?;
    let coords = non_zero(coords)?;

    let reported = ["distance", "distanceMeters"]
        .iter()
        .find_map(|key| activity.get(*key).and_then(coerce_number));
    let raw_type = text_at(activity, "activityType").or_else(|| {
        object_at(activity, "topCandidate").and_then(|c| text_at(c, "type"))
    });

    Ok(move_event(
        format!("segment-{}", index),
        coords,
        travel_distance(reported, from, to),
        raw_type,
        start,
        end,
    ))
}

fn legacy_sample(index: usize, record: &Object) -> Result<Event, Rejection> {
    if index % SIGNAL_STRIDE != 0 {
        return Err(Rejection::Decimated);
    }

    let time = timestamp_at(record, &["timestamp", "timestampMs"])
        .ok_or(Rejection::InvalidTimestamp)?;
    let coords = resolve_lat_lng(record).ok_or(Rejection::MissingCoordinates)?;
    let coords = non_zero(coords)?;
    let source = text_at(record, "source")
        .map(title_case)
        .unwrap_or_else(|| "Location history".to_string());

    Ok(point_event(format!("sample-{}", index), "Location Sample", source, coords, time))
}

struct Place<'a> {
    coords: Option<(f64, f64)>,
    name: Option<&'a str>,
    address: Option<&'a str>,
    place_id: Option<&'a str>,
    semantic_type: Option<&'a str>,
}

/// Reads place details from a visit object, whether they live under
/// `topCandidate` (semantic exports) or `location` (timeline objects).
fn describe_place(visit: &Object) -> Place<'_> {
    let candidate = first_object(visit, &["topCandidate", "location"]);
    let place_location = candidate.and_then(|c| c.get("placeLocation"));

    let coords = place_location
        .and_then(resolve_location)
        .or_else(|| candidate.and_then(resolve_lat_lng))
        .or_else(|| resolve_lat_lng(visit));

    let address = place_location
        .and_then(Value::as_object)
        .and_then(|l| text_at(l, "address"))
        .or_else(|| candidate.and_then(|c| text_at(c, "address")));

    Place {
        coords,
        name: candidate.and_then(|c| text_at(c, "name")),
        address,
        place_id: candidate.and_then(|c| text_at(c, "placeId")),
        semantic_type: candidate
            .and_then(|c| text_at(c, "semanticType"))
            .filter(|t| !t.eq_ignore_ascii_case("unknown")),
    }
}

fn visit_event(
    id: String,
    place: &Place<'_>,
    (latitude, longitude): (f64, f64),
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Event {
    let title = place
        .name
        .map(str::to_string)
        .or_else(|| place.semantic_type.map(title_case))
        .unwrap_or_else(|| DEFAULT_VISIT_TITLE.to_string());

    Event {
        id,
        kind: EventKind::Visit,
        title,
        subtitle: place.address.unwrap_or(DEFAULT_VISIT_SUBTITLE).to_string(),
        start_time: start,
        end_time: end,
        latitude,
        longitude,
        distance_meters: None,
        city: place.address.and_then(extract_city),
        activity_type: None,
        place_id: place.place_id.map(str::to_string),
    }
}

fn move_event(
    id: String,
    (latitude, longitude): (f64, f64),
    distance_meters: Option<f64>,
    raw_type: Option<&str>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Event {
    let activity_type = raw_type.and_then(format_activity_type);
    let title = raw_type
        .map(title_case)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_MOVE_TITLE.to_string());
    let subtitle = match distance_meters {
        Some(meters) => format!("{:.1} km", meters / 1000.0),
        None => "Distance unknown".to_string(),
    };

    Event {
        id,
        kind: EventKind::Move,
        title,
        subtitle,
        start_time: start,
        end_time: end,
        latitude,
        longitude,
        distance_meters,
        city: None,
        activity_type,
        place_id: None,
    }
}

fn point_event(
    id: String,
    title: &str,
    subtitle: String,
    (latitude, longitude): (f64, f64),
    time: DateTime<Utc>,
) -> Event {
    Event {
        id,
        kind: EventKind::Point,
        title: title.to_string(),
        subtitle,
        start_time: time,
        end_time: time,
        latitude,
        longitude,
        distance_meters: None,
        city: None,
        activity_type: None,
        place_id: None,
    }
}

fn segment_times(record: &Object) -> Result<(DateTime<Utc>, DateTime<Utc>), Rejection> {
    let start = timestamp_at(record, &["startTime"]).ok_or(Rejection::InvalidTimestamp)?;
    let end = timestamp_at(record, &["endTime"]).unwrap_or(start);
    Ok((start, end))
}

fn legacy_times(obj: &Object) -> Result<(DateTime<Utc>, DateTime<Utc>), Rejection> {
    let duration = object_at(obj, "duration");
    let start = duration
        .and_then(|d| timestamp_at(d, &LEGACY_START_KEYS))
        .or_else(|| timestamp_at(obj, &LEGACY_START_KEYS))
        .ok_or(Rejection::InvalidTimestamp)?;
    let end = duration
        .and_then(|d| timestamp_at(d, &LEGACY_END_KEYS))
        .or_else(|| timestamp_at(obj, &LEGACY_END_KEYS))
        .unwrap_or(start);
    Ok((start, end))
}

/// Legacy exports use zero as a placeholder for unknown coordinates.
fn non_zero((lat, lng): (f64, f64)) -> Result<(f64, f64), Rejection> {
    if lat == 0.0 || lng == 0.0 {
        return Err(Rejection::ZeroCoordinates);
    }
    Ok((lat, lng))
}

fn travel_distance(
    reported: Option<f64>,
    from: Option<(f64, f64)>,
    to: Option<(f64, f64)>,
) -> Option<f64> {
    reported.filter(|m| *m >= 0.0).or_else(|| match (from, to) {
        (Some(from), Some(to)) => Some(haversine_meters(from, to)),
        _ => None,
    })
}

fn object_at<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    obj.get(key).and_then(Value::as_object)
}

fn first_object<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Object> {
    keys.iter().find_map(|key| object_at(obj, key))
}

fn first_location(obj: &Object, keys: &[&str]) -> Option<(f64, f64)> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(resolve_location))
}
