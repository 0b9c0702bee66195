use crate::domain::models::{Clock, PriceCache};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

/// Retention of historical prices, in seconds. Confirmed prices never change,
/// so entries effectively live for the whole process.
pub const DEFAULT_PRICE_TTL_SECS: u64 = 60_000;

#[derive(Clone, Copy, Debug)]
struct CachedPrice {
    price: f64,
    expires_at: DateTime<Utc>,
}

/// Historical prices kept in memory, shared by all requests.
pub struct InMemoryPriceCache<K> {
    // `price-{timestamp}` -> price
    entries: DashMap<String, CachedPrice>,
    ttl: TimeDelta,
    clock: K,
}

impl<K: Clock> InMemoryPriceCache<K> {
    pub fn new(ttl_secs: u64, clock: K) -> Self {
        let ttl = TimeDelta::try_seconds(ttl_secs as i64).unwrap_or(TimeDelta::MAX);
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(timestamp: i64) -> String {
    format!("price-{timestamp}")
}

impl<K: Clock> PriceCache for InMemoryPriceCache<K> {
    fn get(&self, timestamp: i64) -> Option<f64> {
        let key = cache_key(timestamp);
        let now = self.clock.now();
        let entry = self.entries.get(&key).map(|entry| *entry.value())?;

        if entry.expires_at > now {
            return Some(entry.price);
        }
        self.entries.remove_if(&key, |_, cached| cached.expires_at <= now);
        None
    }

    fn set(&self, timestamp: i64, price: f64) {
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries
            .insert(cache_key(timestamp), CachedPrice { price, expires_at });
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        fn new() -> Self {
            let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        fn advance_secs(&self, secs: i64) {
            let mut now = self.now.lock().unwrap();
            *now += TimeDelta::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn stored_price_is_returned() {
        let cache = InMemoryPriceCache::new(DEFAULT_PRICE_TTL_SECS, ManualClock::new());
        cache.set(1_600_000_000, 45_000.0);

        assert_eq!(cache.get(1_600_000_000), Some(45_000.0));
        assert_eq!(cache.get(1_600_000_001), None);
    }

    #[test]
    fn price_expires_after_retention_window() {
        let clock = ManualClock::new();
        let cache = InMemoryPriceCache::new(DEFAULT_PRICE_TTL_SECS, clock.clone());
        cache.set(1_600_000_000, 45_000.0);

        clock.advance_secs(DEFAULT_PRICE_TTL_SECS as i64 - 1);
        assert_eq!(cache.get(1_600_000_000), Some(45_000.0));

        clock.advance_secs(1);
        assert_eq!(cache.get(1_600_000_000), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn set_restarts_the_retention_window() {
        let clock = ManualClock::new();
        let cache = InMemoryPriceCache::new(100, clock.clone());
        cache.set(42, 1.0);
        clock.advance_secs(60);
        cache.set(42, 2.0);
        clock.advance_secs(60);

        assert_eq!(cache.get(42), Some(2.0));
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let clock = ManualClock::new();
        let cache = InMemoryPriceCache::new(100, clock.clone());
        cache.set(1, 10.0);
        clock.advance_secs(50);
        cache.set(2, 20.0);
        clock.advance_secs(60);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(2), Some(20.0));
    }
}
