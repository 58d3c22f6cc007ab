use std::{
    collections::HashMap,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
    time::{Duration, Instant},
};

/// Source of the current instant. Injected into [`TtlCache`] so freshness can
/// be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let millis = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Keyed cache whose entries are served only while younger than `ttl`.
///
/// Entries are overwritten wholesale by [`TtlCache::put`]; there is no
/// eviction beyond the age check. The lock guards the slot map only and is
/// never held while a caller fetches a replacement, so two concurrent misses
/// may both go upstream.
#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key` if it is still fresh.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.lock();
        entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// The cache clock's current instant.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Stores `value` under `key`, stamped with the current instant.
    pub fn put(&self, key: K, value: V) {
        self.put_at(key, value, self.clock.now());
    }

    /// Stores `value` as if it had been produced at `stored_at`. The entry
    /// expires `ttl` after that instant.
    pub fn put_at(&self, key: K, value: V, stored_at: Instant) {
        self.lock().insert(key, Entry { value, stored_at });
    }

    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        // Entries are written with a single insert; a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn cache() -> (Arc<ManualClock>, TtlCache<&'static str, u32, Arc<ManualClock>>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(HOUR, clock.clone());
        (clock, cache)
    }

    #[test]
    fn cold_cache_misses() {
        let (_, cache) = cache();
        assert_eq!(cache.get(&"top"), None);
    }

    #[test]
    fn serves_values_inside_the_window() {
        let (clock, cache) = cache();
        cache.put("top", 7);

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"top"), Some(7));

        clock.advance(HOUR - Duration::from_secs(2));
        assert_eq!(cache.get(&"top"), Some(7));
    }

    #[test]
    fn expires_once_the_window_elapses() {
        let (clock, cache) = cache();
        cache.put("top", 7);

        clock.advance(HOUR);
        assert_eq!(cache.get(&"top"), None);
    }

    #[test]
    fn put_overwrites_and_restamps() {
        let (clock, cache) = cache();
        cache.put("top", 1);
        clock.advance(HOUR - Duration::from_secs(1));
        cache.put("top", 2);
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.get(&"top"), Some(2));
    }

    #[test]
    fn backdated_entries_expire_from_their_stamp() {
        let (clock, cache) = cache();
        let requested_at = cache.now();
        clock.advance(Duration::from_secs(600));
        cache.put_at("top", 7, requested_at);

        clock.advance(HOUR - Duration::from_secs(601));
        assert_eq!(cache.get(&"top"), Some(7));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"top"), None);
    }

    #[test]
    fn keys_are_independent() {
        let (_, cache) = cache();
        cache.put("tracks", 1);

        assert_eq!(cache.get(&"artists"), None);
        assert_eq!(cache.invalidate(&"tracks"), Some(1));
        assert_eq!(cache.get(&"tracks"), None);
    }
}
