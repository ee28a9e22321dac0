use std::collections::HashMap;

use serde::Deserialize;

use crate::pipeline::parse::fields::extract_city;
use crate::types::event::{Event, EventKind};

/// Externally sourced display details for a place id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceCorrection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Returns a new event set where every visit with a corrected place id is
/// replaced by a rebuilt record. Identity, kind, times and coordinates are
/// carried over untouched.
pub fn apply_corrections(
    events: &[Event],
    corrections: &HashMap<String, PlaceCorrection>,
) -> (Vec<Event>, usize) {
    let mut replaced = 0;

    let events = events
        .iter()
        .map(|event| {
            let correction = match (event.kind, event.place_id.as_deref()) {
                (EventKind::Visit, Some(place_id)) => corrections.get(place_id),
                _ => None,
            };
            match correction {
                Some(correction) => {
                    replaced += 1;
                    corrected(event, correction)
                }
                None => event.clone(),
            }
        })
        .collect();

    (events, replaced)
}

fn corrected(event: &Event, correction: &PlaceCorrection) -> Event {
    let name = non_blank(correction.name.as_deref());
    let address = non_blank(correction.address.as_deref());
    let city = non_blank(correction.city.as_deref())
        .map(str::to_string)
        .or_else(|| address.and_then(extract_city))
        .or_else(|| event.city.clone());

    Event {
        id: event.id.clone(),
        kind: event.kind,
        title: name.map(str::to_string).unwrap_or_else(|| event.title.clone()),
        subtitle: address
            .map(str::to_string)
            .unwrap_or_else(|| event.subtitle.clone()),
        start_time: event.start_time,
        end_time: event.end_time,
        latitude: event.latitude,
        longitude: event.longitude,
        distance_meters: event.distance_meters,
        city,
        activity_type: event.activity_type.clone(),
        place_id: event.place_id.clone(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
