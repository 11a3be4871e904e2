// Response cache with a time-to-live and a size bound.
//
// Lives for one run. Entries expire `ttl` after insertion; when full, the
// oldest entry is evicted to make room.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: HashMap::new(),
        }
    }

    fn is_fresh(&self, inserted: Instant) -> bool {
        inserted.elapsed() < self.ttl
    }

    /// A clone of the live value for `key`. Expired entries are removed.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let inserted = self.entries.get(key).map(|(at, _)| *at)?;
        if self.is_fresh(inserted) {
            self.entries.get(key).map(|(_, v)| v.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.max_entries == 0 || self.ttl.is_zero() {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, (at, _)| at.elapsed() < ttl);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (at, _))| *at)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(300), 10);
        cache.insert("bootstrap", 1);
        advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&"bootstrap"), Some(1));
        advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"bootstrap"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn oldest_entry_evicted_when_full() {
        let mut cache = TtlCache::new(Duration::from_secs(300), 2);
        cache.insert("a", 1);
        advance(Duration::from_secs(1)).await;
        cache.insert("b", 2);
        advance(Duration::from_secs(1)).await;
        cache.insert("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_make_room_first() {
        let mut cache = TtlCache::new(Duration::from_secs(10), 2);
        cache.insert("old", 1);
        advance(Duration::from_secs(5)).await;
        cache.insert("newer", 2);
        advance(Duration::from_secs(6)).await;
        cache.insert("newest", 3);
        assert_eq!(cache.get(&"newer"), Some(2));
        assert_eq!(cache.get(&"newest"), Some(3));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = TtlCache::new(Duration::from_secs(10), 0);
        cache.insert(1, "x");
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reinserting_refreshes_without_eviction() {
        let mut cache = TtlCache::new(Duration::from_secs(10), 1);
        cache.insert("k", 1);
        advance(Duration::from_secs(8)).await;
        cache.insert("k", 2);
        advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&"k"), Some(2));
    }
}
