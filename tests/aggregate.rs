use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use timeline_rs::pipeline::aggregate::{aggregate, RECORDED_POINTS_LABEL};
use timeline_rs::pipeline::enrich::{apply_corrections, PlaceCorrection};
use timeline_rs::pipeline::filter::EventFilter;
use timeline_rs::pipeline::grounding::{summarize, visit_log};
use timeline_rs::types::event::{Event, EventKind};
use timeline_rs::types::stats::NamedCount;

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
}

fn visit(id: &str, title: &str, city: Option<&str>, hour: i64) -> Event {
    Event {
        id: id.to_string(),
        kind: EventKind::Visit,
        title: title.to_string(),
        subtitle: "Somewhere".to_string(),
        start_time: at(hour),
        end_time: at(hour + 1),
        latitude: 48.85,
        longitude: 2.35,
        distance_meters: None,
        city: city.map(str::to_string),
        activity_type: None,
        place_id: Some(format!("place-{id}")),
    }
}

fn travel(id: &str, activity: Option<&str>, meters: Option<f64>, hour: i64) -> Event {
    Event {
        id: id.to_string(),
        kind: EventKind::Move,
        title: "Travel".to_string(),
        subtitle: String::new(),
        start_time: at(hour),
        end_time: at(hour),
        latitude: 48.85,
        longitude: 2.35,
        distance_meters: meters,
        city: None,
        activity_type: activity.map(str::to_string),
        place_id: None,
    }
}

fn point(id: &str, hour: i64) -> Event {
    Event {
        id: id.to_string(),
        kind: EventKind::Point,
        title: "Location Sample".to_string(),
        subtitle: String::new(),
        start_time: at(hour),
        end_time: at(hour),
        latitude: 48.85,
        longitude: 2.35,
        distance_meters: None,
        city: None,
        activity_type: None,
        place_id: None,
    }
}

fn named(name: &str, count: usize) -> NamedCount {
    NamedCount {
        name: name.to_string(),
        count,
    }
}

fn sample_events() -> Vec<Event> {
    vec![
        visit("1", "Home", Some("Paris"), 0),
        travel("2", Some("WALKING"), Some(1200.0), 2),
        visit("3", "Bakery", Some("Paris"), 3),
        travel("4", Some("IN BUS"), Some(5400.0), 5),
        visit("5", "Office", Some("Lyon"), 8),
        visit("6", "Home", Some("Paris"), 20),
        visit("7", "Station", Some("Lyon"), 30),
        visit("8", "Museum", Some("Nice"), 40),
        travel("9", Some("WALKING"), Some(700.0), 41),
        point("10", 50),
    ]
}

#[test]
fn empty_input_yields_zero_stats() {
    let stats = aggregate(&[]);
    assert_eq!(stats.total_distance_km, 0);
    assert_eq!(stats.total_visits, 0);
    assert_eq!(stats.unique_places, 0);
    assert!(stats.top_cities.is_empty());
    assert!(stats.activity_breakdown.is_empty());
    assert!(stats.place_visit_counts.is_empty());
    assert_eq!(stats.date_range.start, stats.date_range.end);
}

#[test]
fn aggregates_sample_history() {
    let stats = aggregate(&sample_events());

    assert_eq!(stats.total_distance_km, 7);
    assert_eq!(stats.total_visits, 6);
    assert_eq!(stats.unique_places, 5);
    assert_eq!(
        stats.top_cities,
        vec![named("Paris", 3), named("Lyon", 2), named("Nice", 1)]
    );
    assert_eq!(
        stats.activity_breakdown,
        vec![named("WALKING", 2), named("IN BUS", 1)]
    );
    assert_eq!(stats.place_visit_counts.get("Home"), Some(&2));
    assert_eq!(stats.place_visit_counts.len(), 5);
    assert_eq!(stats.date_range.start, at(0));
    assert_eq!(stats.date_range.end, at(50));
}

#[test]
fn unique_places_are_counted_by_title() {
    let mut second_home = visit("2", "Home", None, 5);
    second_home.place_id = Some("a-different-place".to_string());
    second_home.latitude = -33.86;

    let stats = aggregate(&[visit("1", "Home", None, 0), second_home]);
    assert_eq!(stats.total_visits, 2);
    assert_eq!(stats.unique_places, 1);
    assert_eq!(stats.place_visit_counts.get("Home"), Some(&2));
    assert!(stats.top_cities.is_empty());
}

#[test]
fn top_cities_are_capped_and_ties_keep_first_seen_order() {
    let cities = ["Austin", "Boston", "Chicago", "Austin", "Chicago", "Denver", "El Paso", "Fresno", "Gary"];
    let events: Vec<Event> = cities
        .iter()
        .enumerate()
        .map(|(i, city)| visit(&i.to_string(), city, Some(city), i as i64))
        .collect();

    let stats = aggregate(&events);
    assert_eq!(
        stats.top_cities,
        vec![
            named("Austin", 2),
            named("Chicago", 2),
            named("Boston", 1),
            named("Denver", 1),
            named("El Paso", 1),
        ]
    );
}

#[test]
fn points_only_history_reports_recorded_points() {
    let events = vec![point("1", 0), point("2", 1), point("3", 2)];
    let stats = aggregate(&events);
    assert_eq!(stats.activity_breakdown, vec![named(RECORDED_POINTS_LABEL, 3)]);
    assert_eq!(stats.total_visits, 0);
}

#[test]
fn moves_without_activity_type_fall_back_to_recorded_points() {
    let events = vec![travel("1", None, Some(300.0), 0), visit("2", "Cafe", None, 1)];
    let stats = aggregate(&events);
    assert_eq!(stats.activity_breakdown, vec![named(RECORDED_POINTS_LABEL, 2)]);
}

#[test]
fn distance_rounds_to_nearest_kilometre() {
    let below = vec![travel("1", Some("CYCLING"), Some(1400.0), 0)];
    assert_eq!(aggregate(&below).total_distance_km, 1);

    let above = vec![
        travel("1", Some("CYCLING"), Some(1400.0), 0),
        travel("2", Some("CYCLING"), Some(200.0), 1),
    ];
    assert_eq!(aggregate(&above).total_distance_km, 2);
}

#[test]
fn date_range_does_not_require_sorted_input() {
    let mut events = sample_events();
    events.reverse();
    let stats = aggregate(&events);
    assert_eq!(stats.date_range.start, at(0));
    assert_eq!(stats.date_range.end, at(50));
}

#[test]
fn date_range_starts_at_earliest_start_time() {
    let stats = aggregate(&[inverted_visit()]);
    assert_eq!(stats.date_range.start, at(24));
    assert_eq!(stats.date_range.end, at(24));

    let events = vec![inverted_visit(), visit("2", "Bakery", Some("Paris"), 30)];
    let stats = aggregate(&events);
    assert_eq!(stats.date_range.start, at(24));
    assert_eq!(stats.date_range.end, at(31));
}

fn inverted_visit() -> Event {
    let mut event = visit("1", "Home", Some("Paris"), 24);
    event.end_time = at(0);
    event
}

#[test]
fn filter_narrows_by_date_place_and_kind() {
    let events = sample_events();

    let window = EventFilter {
        from: Some(at(3)),
        to: Some(at(20)),
        ..Default::default()
    };
    let ids: Vec<String> = window.apply(&events).into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["3", "4", "5", "6"]);

    let lyon = EventFilter {
        place: Some("lyon".to_string()),
        ..Default::default()
    };
    let stats = aggregate(&lyon.apply(&events));
    assert_eq!(stats.total_visits, 2);
    assert_eq!(stats.top_cities, vec![named("Lyon", 2)]);

    let moves = EventFilter {
        kinds: Some(vec![EventKind::Move]),
        ..Default::default()
    };
    assert_eq!(moves.apply(&events).len(), 3);

    assert_eq!(EventFilter::default().apply(&events), events);
}

#[test]
fn corrections_replace_visit_display_fields() {
    let events = sample_events();
    let mut corrections = HashMap::new();
    corrections.insert(
        "place-5".to_string(),
        PlaceCorrection {
            name: Some("Head Office".to_string()),
            address: Some("1 Rue de la Republique, Marseille, 13001, France".to_string()),
            city: None,
        },
    );

    let (corrected, replaced) = apply_corrections(&events, &corrections);
    assert_eq!(replaced, 1);

    let office = corrected.iter().find(|e| e.id == "5").expect("office");
    let original = events.iter().find(|e| e.id == "5").expect("original");
    assert_eq!(office.title, "Head Office");
    assert_eq!(office.city.as_deref(), Some("Marseille"));
    assert_eq!(office.kind, original.kind);
    assert_eq!(office.start_time, original.start_time);
    assert_eq!(office.end_time, original.end_time);
    assert_eq!((office.latitude, office.longitude), (original.latitude, original.longitude));

    let stats = aggregate(&corrected);
    assert_eq!(stats.place_visit_counts.get("Head Office"), Some(&1));
    assert!(stats.place_visit_counts.get("Office").is_none());
    assert_eq!(corrected.len(), events.len());
}

#[test]
fn grounding_text_lists_visits_and_totals() {
    let events = sample_events();
    let log = visit_log(&events, 2);
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
        vec![
            "2024-03-01 00:00-01:00 | Home | Paris",
            "2024-03-01 03:00-04:00 | Bakery | Paris",
        ]
    );

    let summary = summarize(&aggregate(&events));
    assert!(summary.contains("Total distance: 7 km"));
    assert!(summary.contains("Visits: 6 across 5 unique places"));
    assert!(summary.contains("Top cities: Paris (3), Lyon (2), Nice (1)"));
    assert!(summary.contains("Most visited places: Home (2)"));
}

proptest! {
    #[test]
    fn aggregation_ignores_input_order(events in Just(sample_events()).prop_shuffle()) {
        let expected = aggregate(&sample_events());
        let shuffled = aggregate(&events);

        prop_assert_eq!(shuffled.total_distance_km, expected.total_distance_km);
        prop_assert_eq!(shuffled.total_visits, expected.total_visits);
        prop_assert_eq!(shuffled.unique_places, expected.unique_places);
        prop_assert_eq!(&shuffled.place_visit_counts, &expected.place_visit_counts);
        prop_assert_eq!(shuffled.date_range, expected.date_range);
        // City counts are all distinct, so ranking is order independent.
        prop_assert_eq!(&shuffled.top_cities, &expected.top_cities);

        let mut activities = shuffled.activity_breakdown.clone();
        let mut expected_activities = expected.activity_breakdown.clone();
        activities.sort_by(|a, b| a.name.cmp(&b.name));
        expected_activities.sort_by(|a, b| a.name.cmp(&b.name));
        prop_assert_eq!(activities, expected_activities);
    }
}
