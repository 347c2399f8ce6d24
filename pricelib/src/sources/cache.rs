use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

// Single-value cache that expires `ttl` after insertion
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache { ttl, entry: None }
    }

    pub fn get(&self) -> Option<&T> {
        self.get_at(Instant::now())
    }

    pub fn get_at(&self, now: Instant) -> Option<&T> {
        match &self.entry {
            Some((stored_at, value)) if now.saturating_duration_since(*stored_at) < self.ttl => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn insert(&mut self, value: T) {
        self.insert_at(value, Instant::now());
    }

    pub fn insert_at(&mut self, value: T, now: Instant) {
        self.entry = Some((now, value));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

impl<T> Default for TtlCache<T> {
    fn default() -> Self {
        TtlCache::new(DEFAULT_TTL)
    }
}
