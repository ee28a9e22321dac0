use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            start: instant,
            end: instant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_distance_km: u64,
    pub total_visits: usize,
    pub unique_places: usize,
    /// At most five entries, descending by count, ties in first-seen order.
    pub top_cities: Vec<NamedCount>,
    pub activity_breakdown: Vec<NamedCount>,
    pub place_visit_counts: BTreeMap<String, usize>,
    pub date_range: DateRange,
}
