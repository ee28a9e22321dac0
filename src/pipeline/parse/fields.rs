use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Matches `"34.4102107°, -119.8555576°"`.
static DEGREE_PAIR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)°\s*,\s*(-?\d+(?:\.\d+)?)°\s*$")
        .expect("degree pair pattern is valid")
});

const E7_SCALE: f64 = 10_000_000.0;

const E7_KEYS: [(&str, &str); 3] = [
    ("latitudeE7", "longitudeE7"),
    ("latE7", "lngE7"),
    ("centerLatE7", "centerLngE7"),
];

const PLAIN_KEYS: [(&str, &str); 3] = [
    ("latitude", "longitude"),
    ("lat", "lng"),
    ("lat", "lon"),
];

const STRING_KEYS: [&str; 3] = ["latLng", "LatLng", "point"];

/// Parses a decimal-degree pair string. Degrees-minutes notation is rejected.
pub fn parse_lat_lng(s: &str) -> Option<(f64, f64)> {
    let caps = DEGREE_PAIR_REGEX.captures(s)?;
    let lat = caps.get(1)?.as_str().parse().ok()?;
    let lng = caps.get(2)?.as_str().parse().ok()?;
    checked(lat, lng)
}

/// Coerces a JSON number or numeric string.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn decode_e7(value: &Value) -> Option<f64> {
    coerce_number(value).map(|n| n / E7_SCALE)
}

/// Resolves a coordinate pair from an object, trying E7 fields first, then
/// plain degree fields, then a degree-pair string.
pub fn resolve_lat_lng(obj: &Map<String, Value>) -> Option<(f64, f64)> {
    for (lat_key, lng_key) in E7_KEYS {
        let lat = obj.get(lat_key).and_then(decode_e7);
        let lng = obj.get(lng_key).and_then(decode_e7);
        if let (Some(lat), Some(lng)) = (lat, lng) {
            return checked(lat, lng);
        }
    }

    for (lat_key, lng_key) in PLAIN_KEYS {
        let lat = obj.get(lat_key).and_then(coerce_number);
        let lng = obj.get(lng_key).and_then(coerce_number);
        if let (Some(lat), Some(lng)) = (lat, lng) {
            return checked(lat, lng);
        }
    }

    STRING_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .and_then(parse_lat_lng)
}

/// Resolves a location given either as a degree-pair string or as an object.
pub fn resolve_location(value: &Value) -> Option<(f64, f64)> {
    match value {
        Value::String(s) => parse_lat_lng(s),
        Value::Object(obj) => resolve_lat_lng(obj),
        _ => None,
    }
}

fn checked(lat: f64, lng: f64) -> Option<(f64, f64)> {
    let valid = lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng);
    valid.then_some((lat, lng))
}

/// Accepts RFC 3339 strings and epoch milliseconds (number or numeric string).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// First parseable timestamp among `keys`.
pub fn timestamp_at(obj: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(parse_timestamp))
}

/// Non-empty trimmed string field.
pub fn text_at<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Guesses the city from a US-style "Street, City, Region Zip, Country" address.
pub fn extract_city(address: &str) -> Option<String> {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();

    let city = match parts.len() {
        n if n >= 3 => {
            let region = parts[n - 2];
            if region.chars().any(|c| c.is_ascii_digit()) {
                parts[n - 3]
            } else {
                region
            }
        }
        2 => parts[0],
        _ => parts.first().copied()?,
    };

    (!city.is_empty()).then(|| city.to_string())
}

pub fn format_activity_type(raw: &str) -> Option<String> {
    let label = raw.trim().replace('_', " ");
    (!label.is_empty()).then_some(label)
}

/// `"INFERRED_HOME"` -> `"Inferred Home"`.
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn haversine_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    const R: f64 = 6_371_000.0; // Earth radius in m

    let (lat1, lon1) = from;
    let (lat2, lon2) = to;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    R * c
}
