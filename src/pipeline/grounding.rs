use std::fmt::Write;

use crate::types::event::{Event, EventKind};
use crate::types::stats::{NamedCount, Stats};

const TOP_PLACES: usize = 10;

/// One line per visit, in input order, capped at `limit` visits.
pub fn visit_log(events: &[Event], limit: usize) -> String {
    let mut log = String::new();
    for event in events
        .iter()
        .filter(|e| e.kind == EventKind::Visit)
        .take(limit)
    {
        let place = event.city.as_deref().unwrap_or(&event.subtitle);
        let _ = writeln!(
            log,
            "{} {}-{} | {} | {}",
            event.start_time.format("%Y-%m-%d"),
            event.start_time.format("%H:%M"),
            event.end_time.format("%H:%M"),
            event.title,
            place
        );
    }
    log
}

/// Plain-text digest of the stats for the assistant prompt.
pub fn summarize(stats: &Stats) -> String {
    let mut summary = String::new();
    let _ = writeln!(
        summary,
        "Period: {} to {}",
        stats.date_range.start.format("%Y-%m-%d"),
        stats.date_range.end.format("%Y-%m-%d")
    );
    let _ = writeln!(summary, "Total distance: {} km", stats.total_distance_km);
    let _ = writeln!(
        summary,
        "Visits: {} across {} unique places",
        stats.total_visits, stats.unique_places
    );
    let _ = writeln!(summary, "Top cities: {}", join_counts(&stats.top_cities));
    let _ = writeln!(
        summary,
        "Activities: {}",
        join_counts(&stats.activity_breakdown)
    );

    let mut places: Vec<(&String, &usize)> = stats.place_visit_counts.iter().collect();
    places.sort_by(|a, b| b.1.cmp(a.1));
    let top_places: Vec<String> = places
        .into_iter()
        .take(TOP_PLACES)
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect();
    let top_places = if top_places.is_empty() {
        "none".to_string()
    } else {
        top_places.join(", ")
    };
    let _ = writeln!(summary, "Most visited places: {}", top_places);

    summary
}

fn join_counts(entries: &[NamedCount]) -> String {
    if entries.is_empty() {
        return "none".to_string();
    }
    entries
        .iter()
        .map(|entry| format!("{} ({})", entry.name, entry.count))
        .collect::<Vec<String>>()
        .join(", ")
}
