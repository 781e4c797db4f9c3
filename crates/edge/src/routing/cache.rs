//! In-memory validation cache with TTL
//!
//! Remembers organization service verdicts so repeat requests for the same
//! tenant skip the lookup. Only verdicts are stored; outages never are.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Default cache TTL (1 minute)
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// What the organization service said about a lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedVerdict {
    /// Tenant may serve traffic as this organization
    Confirmed(String),
    /// Unknown, inactive or on a lapsed plan
    Rejected,
}

struct Slot {
    verdict: CachedVerdict,
    stored_at: Instant,
}

/// Thread-safe verdict cache keyed by `LookupKey::cache_key`
pub struct ValidationCache {
    slots: RwLock<HashMap<String, Slot>>,
    ttl: Duration,
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_fresh(&self, slot: &Slot) -> bool {
        slot.stored_at.elapsed() <= self.ttl
    }

    /// Fresh verdict for a key, if any
    pub fn get(&self, key: &str) -> Option<CachedVerdict> {
        let slots = self.slots.read().ok()?;
        slots
            .get(key)
            .filter(|slot| self.is_fresh(slot))
            .map(|slot| slot.verdict.clone())
    }

    pub fn set(&self, key: &str, verdict: CachedVerdict) {
        if let Ok(mut slots) = self.slots.write() {
            slots.insert(
                key.to_string(),
                Slot {
                    verdict,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop stale verdicts; run periodically from the server task
    pub fn cleanup(&self) {
        if let Ok(mut slots) = self.slots.write() {
            slots.retain(|_, slot| slot.stored_at.elapsed() <= self.ttl);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let Ok(slots) = self.slots.read() else {
            return CacheStats::default();
        };
        let total_entries = slots.len();
        let active_entries = slots.values().filter(|slot| self.is_fresh(slot)).count();
        CacheStats {
            total_entries,
            expired_entries: total_entries - active_entries,
            active_entries,
        }
    }
}

/// Cache statistics
#[derive(Default, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}
