use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::types::event::{Event, EventKind};
use crate::types::stats::{DateRange, NamedCount, Stats};

const TOP_CITIES: usize = 5;
pub const RECORDED_POINTS_LABEL: &str = "Recorded Points";

/// Counter that remembers the order in which keys were first seen, so a
/// stable sort on counts breaks ties by first appearance.
#[derive(Debug, Default)]
struct FrequencyMap {
    entries: Vec<NamedCount>,
    index: HashMap<String, usize>,
}

impl FrequencyMap {
    fn increment(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(NamedCount {
                    name: key.to_string(),
                    count: 1,
                });
            }
        }
    }

    fn ranked(mut self, limit: usize) -> Vec<NamedCount> {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        self.entries.truncate(limit);
        self.entries
    }

    fn into_entries(self) -> Vec<NamedCount> {
        self.entries
    }
}

/// Single-pass summary of any event subset, in any order.
pub fn aggregate(events: &[Event]) -> Stats {
    let Some(first) = events.first() else {
        return Stats {
            total_distance_km: 0,
            total_visits: 0,
            unique_places: 0,
            top_cities: Vec::new(),
            activity_breakdown: Vec::new(),
            place_visit_counts: Default::default(),
            date_range: DateRange::at(Utc::now()),
        };
    };

    let mut distance_meters = 0.0;
    let mut total_visits = 0;
    let mut titles: HashSet<&str> = HashSet::new();
    let mut cities = FrequencyMap::default();
    let mut places = FrequencyMap::default();
    let mut activities = FrequencyMap::default();
    let mut date_range = DateRange::at(first.start_time);

    for event in events {
        date_range.start = date_range.start.min(event.start_time);
        date_range.end = date_range.end.max(event.start_time).max(event.end_time);

        if let Some(meters) = event.distance_meters {
            distance_meters += meters;
        }

        match event.kind {
            EventKind::Visit => {
                total_visits += 1;
                titles.insert(event.title.as_str());
                places.increment(&event.title);
                if let Some(city) = &event.city {
                    cities.increment(city);
                }
            }
            EventKind::Move => {
                if let Some(activity) = &event.activity_type {
                    activities.increment(activity);
                }
            }
            EventKind::Point => {}
        }
    }

    let mut activity_breakdown = activities.into_entries();
    if activity_breakdown.is_empty() {
        activity_breakdown.push(NamedCount {
            name: RECORDED_POINTS_LABEL.to_string(),
            count: events.len(),
        });
    }

    Stats {
        total_distance_km: (distance_meters / 1000.0).round().max(0.0) as u64,
        total_visits,
        unique_places: titles.len(),
        top_cities: cities.ranked(TOP_CITIES),
        activity_breakdown,
        place_visit_counts: places
            .into_entries()
            .into_iter()
            .map(|entry| (entry.name, entry.count))
            .collect(),
        date_range,
    }
}
