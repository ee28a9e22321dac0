use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::event::{Event, EventKind};

/// Narrows a base event set. Every bound is optional; an empty filter keeps everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Case-insensitive match against title or city.
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.place.is_none() && self.kinds.is_none()
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(from) = self.from {
            if event.start_time < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.start_time > to {
                return false;
            }
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        match self.place.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(place) => {
                let needle = place.to_lowercase();
                event.title.to_lowercase().contains(&needle)
                    || event
                        .city
                        .as_deref()
                        .map(|city| city.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            }
            None => true,
        }
    }

    /// Returns the matching subset, keeping input order.
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        if self.is_empty() {
            return events.to_vec();
        }
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}
