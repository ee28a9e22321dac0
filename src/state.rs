use crate::config::Config;
use crate::types::event::Event;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    cache: Arc<DashMap<String, CachedHistory>>,
}

/// A parsed base event set. Filtering never touches it; enrichment swaps it whole.
struct CachedHistory {
    events: Arc<Vec<Event>>,
    inserted_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: Arc::new(DashMap::new()),
        }
    }

    pub fn insert(&self, history_id: String, events: Vec<Event>) {
        self.cache.insert(
            history_id,
            CachedHistory {
                events: Arc::new(events),
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, history_id: &str) -> Option<Arc<Vec<Event>>> {
        self.cache
            .get(history_id)
            .map(|entry| Arc::clone(&entry.events))
    }

    /// Rebuilds the base set of a history while holding its entry lock, so
    /// concurrent rebuilds of the same history apply one after another.
    /// Returns `None` if the history is unknown or expired.
    pub fn update<R>(
        &self,
        history_id: &str,
        rebuild: impl FnOnce(&[Event]) -> (Vec<Event>, R),
    ) -> Option<R> {
        let mut entry = self.cache.get_mut(history_id)?;
        let (events, output) = rebuild(&entry.events);
        entry.events = Arc::new(events);
        Some(output)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn evict_expired(&self, ttl: Duration) {
        let now = Instant::now();
        self.cache.retain(|_, cached| {
            now.duration_since(cached.inserted_at) < ttl
        });
        tracing::info!("Cache eviction complete. Current size: {}", self.cache.len());
    }
}
