// Terminology response cache
// Keyed by the full upstream URL; entries are overwritten on re-fetch, never merged

use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};

// Longest TTL honored; larger values are clamped so the expiry stays representable
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

struct CacheEntry {
    body: Value,
    expires_at: Instant,
}

pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Expired entries read as a miss but are left in place
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    pub fn set(&self, key: &str, body: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                expires_at: Instant::now() + ttl.min(MAX_TTL),
            },
        );
    }

    /// Remove every entry expired at `now`, returning how many were dropped
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.body.clone())
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
