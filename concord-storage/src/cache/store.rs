//! Per-entity-type keyed Record store.
//!
//! A store is either unbounded (`HashMap`) or bounded-LRU (`LruCache`). Both
//! hold `Arc<R>`: `put` swaps the whole `Arc`, so a concurrent reader sees
//! either the old or the new Record, never a mixture.

use super::lock::{rw_read, rw_write};
use super::traits::{CacheStats, Record};
use concord_core::{ConfigError, EntityType, EvictionPolicy};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

const SOURCE: &str = "cache::store";

/// A validated store factory: what a registry builds for a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFactory {
    Unbounded,
    Lru(NonZeroUsize),
}

impl StoreFactory {
    /// Validate a configured policy for `entity_type`.
    pub fn from_policy(entity_type: EntityType, policy: EvictionPolicy) -> Result<Self, ConfigError> {
        match policy {
            EvictionPolicy::Unbounded => Ok(StoreFactory::Unbounded),
            EvictionPolicy::Lru { capacity } => NonZeroUsize::new(capacity)
                .map(StoreFactory::Lru)
                .ok_or(ConfigError::InvalidCapacity { entity_type }),
        }
    }

    pub fn build<R: Record>(&self) -> EntryStore<R> {
        match self {
            StoreFactory::Unbounded => EntryStore::unbounded(),
            StoreFactory::Lru(capacity) => EntryStore::lru(*capacity),
        }
    }
}

enum Entries<R: Record> {
    Unbounded(HashMap<R::Key, Arc<R>>),
    Lru(LruCache<R::Key, Arc<R>>),
}

/// Keyed store for one Record type.
pub struct EntryStore<R: Record> {
    entries: RwLock<Entries<R>>,
    bounded: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<R: Record> EntryStore<R> {
    /// A store that never evicts.
    pub fn unbounded() -> Self {
        Self::with_entries(Entries::Unbounded(HashMap::new()))
    }

    /// A store holding at most `capacity` Records.
    pub fn lru(capacity: NonZeroUsize) -> Self {
        Self::with_entries(Entries::Lru(LruCache::new(capacity)))
    }

    fn with_entries(entries: Entries<R>) -> Self {
        Self {
            bounded: matches!(entries, Entries::Lru(_)),
            entries: RwLock::new(entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// The capacity bound, or `None` for an unbounded store.
    pub fn capacity(&self) -> Option<usize> {
        match &*rw_read(&self.entries, SOURCE, "capacity") {
            Entries::Unbounded(_) => None,
            Entries::Lru(cache) => Some(cache.cap().get()),
        }
    }

    /// Look up a Record by key.
    ///
    /// On an LRU store this counts as an access and takes the write lock.
    pub fn get(&self, key: &R::Key) -> Option<Arc<R>> {
        let found = if self.bounded {
            match &mut *rw_write(&self.entries, SOURCE, "get") {
                Entries::Lru(cache) => cache.get(key).cloned(),
                Entries::Unbounded(map) => map.get(key).cloned(),
            }
        } else {
            match &*rw_read(&self.entries, SOURCE, "get") {
                Entries::Unbounded(map) => map.get(key).cloned(),
                Entries::Lru(cache) => cache.peek(key).cloned(),
            }
        };
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert or replace the Record under its key.
    pub fn put(&self, record: R) {
        self.put_arc(Arc::new(record));
    }

    /// Insert or replace an already shared Record.
    pub fn put_arc(&self, record: Arc<R>) {
        let key = record.key();
        let mut entries = rw_write(&self.entries, SOURCE, "put");
        match &mut *entries {
            Entries::Unbounded(map) => {
                map.insert(key, record);
            }
            Entries::Lru(cache) => {
                // `push` returns the replaced entry for an existing key, or
                // the evicted one when at capacity.
                if let Some((evicted, _)) = cache.push(key.clone(), record) {
                    if evicted != key {
                        self.evictions.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!(
                            entity_type = %R::ENTITY_TYPE,
                            key = ?evicted,
                            "Evicted least-recently-used record"
                        );
                    }
                }
            }
        }
    }

    /// Remove and return the Record under `key`.
    pub fn remove(&self, key: &R::Key) -> Option<Arc<R>> {
        match &mut *rw_write(&self.entries, SOURCE, "remove") {
            Entries::Unbounded(map) => map.remove(key),
            Entries::Lru(cache) => cache.pop(key),
        }
    }

    /// Snapshot of every Record currently held, in no particular order.
    ///
    /// Does not count as an access for LRU purposes.
    pub fn values(&self) -> Vec<Arc<R>> {
        match &*rw_read(&self.entries, SOURCE, "values") {
            Entries::Unbounded(map) => map.values().cloned().collect(),
            Entries::Lru(cache) => cache.iter().map(|(_, v)| Arc::clone(v)).collect(),
        }
    }

    /// Lazily filter a snapshot of the store.
    ///
    /// The snapshot is taken when `find` is called; the predicate runs as the
    /// iterator is consumed, outside the lock.
    pub fn find<P>(&self, mut predicate: P) -> impl Iterator<Item = Arc<R>> + Send + 'static
    where
        P: FnMut(&R) -> bool + Send + 'static,
    {
        self.values().into_iter().filter(move |r| predicate(r))
    }

    pub fn len(&self) -> usize {
        match &*rw_read(&self.entries, SOURCE, "len") {
            Entries::Unbounded(map) => map.len(),
            Entries::Lru(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match &mut *rw_write(&self.entries, SOURCE, "clear") {
            Entries::Unbounded(map) => map.clear(),
            Entries::Lru(cache) => cache.clear(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.len() as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<R: Record> std::fmt::Debug for EntryStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("entity_type", &R::ENTITY_TYPE)
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use concord_core::{MemberData, Optional, Snowflake, UserData};

    fn user(id: u64, name: &str) -> UserData {
        UserData {
            id: Snowflake::new(id),
            username: name.to_string(),
            discriminator: "0001".to_string(),
            avatar: None,
            bot: Optional::Missing,
            public_flags: Optional::Missing,
        }
    }

    fn member(guild: u64, user: u64) -> MemberData {
        MemberData {
            guild_id: Snowflake::new(guild),
            user_id: Snowflake::new(user),
            nick: None,
            roles: vec![],
            joined_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            premium_since: Optional::Missing,
            deaf: false,
            mute: false,
            pending: Optional::Missing,
        }
    }

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_put_then_get_returns_equal_record() {
        let store = EntryStore::<UserData>::unbounded();
        store.put(user(1, "a"));
        assert_eq!(store.get(&Snowflake::new(1)).as_deref(), Some(&user(1, "a")));
        assert!(store.get(&Snowflake::new(2)).is_none());
    }

    #[test]
    fn test_put_replaces_whole_record() {
        let store = EntryStore::<UserData>::unbounded();
        store.put(user(1, "old"));
        let before = store.get(&Snowflake::new(1)).unwrap();
        store.put(user(1, "new"));

        // The snapshot taken earlier is untouched.
        assert_eq!(before.username, "old");
        assert_eq!(store.get(&Snowflake::new(1)).unwrap().username, "new");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_composite_key_store() {
        let store = EntryStore::<MemberData>::unbounded();
        store.put(member(10, 1));
        store.put(member(11, 1));
        assert_eq!(store.len(), 2);
        assert!(store.get(&(Snowflake::new(10), Snowflake::new(1))).is_some());
        assert!(store.remove(&(Snowflake::new(10), Snowflake::new(1))).is_some());
        assert!(store.get(&(Snowflake::new(10), Snowflake::new(1))).is_none());
    }

    #[test]
    fn test_lru_evicts_least_recently_accessed() {
        let store = EntryStore::<UserData>::lru(cap(2));
        store.put(user(1, "a"));
        store.put(user(2, "b"));
        store.put(user(3, "c"));

        // Capacity 2: A was the oldest, so inserting C evicted it.
        assert!(store.get(&Snowflake::new(1)).is_none());
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_lru_read_promotes_entry() {
        let store = EntryStore::<UserData>::lru(cap(2));
        store.put(user(1, "a"));
        store.put(user(2, "b"));
        assert!(store.get(&Snowflake::new(1)).is_some());
        store.put(user(3, "c"));

        assert!(store.get(&Snowflake::new(1)).is_some());
        assert!(store.get(&Snowflake::new(2)).is_none());
    }

    #[test]
    fn test_lru_replacement_is_not_eviction() {
        let store = EntryStore::<UserData>::lru(cap(1));
        store.put(user(1, "a"));
        store.put(user(1, "b"));
        assert_eq!(store.stats().evictions, 0);
        assert_eq!(store.get(&Snowflake::new(1)).unwrap().username, "b");
    }

    #[test]
    fn test_find_filters_snapshot() {
        let store = EntryStore::<MemberData>::unbounded();
        store.put(member(10, 1));
        store.put(member(10, 2));
        store.put(member(11, 3));

        let guild = Snowflake::new(10);
        let mut found: Vec<_> = store
            .find(move |m| m.guild_id == guild)
            .map(|m| m.user_id.value())
            .collect();
        found.sort();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn test_find_does_not_promote() {
        let store = EntryStore::<UserData>::lru(cap(2));
        store.put(user(1, "a"));
        store.put(user(2, "b"));
        assert_eq!(store.find(|_| true).count(), 2);
        store.put(user(3, "c"));
        assert!(store.get(&Snowflake::new(1)).is_none());
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let store = EntryStore::<UserData>::unbounded();
        store.put(user(1, "a"));
        store.get(&Snowflake::new(1));
        store.get(&Snowflake::new(2));
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_clear_empties_store() {
        let store = EntryStore::<UserData>::lru(cap(4));
        store.put(user(1, "a"));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.capacity(), Some(4));
    }

    #[test]
    fn test_factory_rejects_zero_capacity() {
        let err = StoreFactory::from_policy(EntityType::VoiceState, EvictionPolicy::Lru { capacity: 0 })
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidCapacity {
                entity_type: EntityType::VoiceState
            }
        );
        assert_eq!(
            StoreFactory::from_policy(EntityType::User, EvictionPolicy::Unbounded).unwrap(),
            StoreFactory::Unbounded
        );
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use concord_core::{Optional, Snowflake, UserData};
    use proptest::prelude::*;

    fn user(id: u64) -> UserData {
        UserData {
            id: Snowflake::new(id),
            username: format!("user{}", id),
            discriminator: "0001".to_string(),
            avatar: None,
            bot: Optional::Missing,
            public_flags: Optional::Missing,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_lru_never_exceeds_capacity(
            capacity in 1usize..16,
            ids in prop::collection::vec(0u64..64, 0..128),
        ) {
            let store = EntryStore::<UserData>::lru(NonZeroUsize::new(capacity).unwrap());
            for id in ids {
                store.put(user(id));
                prop_assert!(store.len() <= capacity);
            }
        }

        #[test]
        fn prop_last_put_wins(ids in prop::collection::vec(0u64..32, 1..64)) {
            let store = EntryStore::<UserData>::unbounded();
            for id in &ids {
                store.put(user(*id));
            }
            for id in &ids {
                let stored = store.get(&Snowflake::new(*id));
                prop_assert_eq!(stored.as_deref(), Some(&user(*id)));
            }
        }
    }
}
