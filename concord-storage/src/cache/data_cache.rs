//! Typed facade over the eviction policy registry.
//!
//! This is the surface shared by the event-ingestion pipeline (which feeds
//! Records in) and the strategy layer (which writes remote results back).

use super::registry::EvictionPolicyRegistry;
use super::store::EntryStore;
use super::traits::{CacheStats, Record};
use concord_core::{CacheConfig, ConfigError};
use std::sync::Arc;

/// Cheaply cloneable handle to the process-local Record cache.
#[derive(Debug, Clone)]
pub struct DataCache {
    registry: Arc<EvictionPolicyRegistry>,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(EvictionPolicyRegistry::new())
    }
}

impl DataCache {
    pub fn new(registry: EvictionPolicyRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(EvictionPolicyRegistry::from_config(config)?))
    }

    pub fn registry(&self) -> &EvictionPolicyRegistry {
        &self.registry
    }

    /// The store holding `R` Records.
    pub fn store<R: Record>(&self) -> Arc<EntryStore<R>> {
        self.registry.resolve::<R>()
    }

    pub fn get<R: Record>(&self, key: &R::Key) -> Option<Arc<R>> {
        self.store::<R>().get(key)
    }

    /// Lazily filter a snapshot of the `R` store.
    pub fn find<R, P>(&self, predicate: P) -> impl Iterator<Item = Arc<R>> + Send + 'static
    where
        R: Record,
        P: FnMut(&R) -> bool + Send + 'static,
    {
        self.store::<R>().find(predicate)
    }

    pub fn put<R: Record>(&self, record: R) {
        self.store::<R>().put(record);
    }

    pub fn put_arc<R: Record>(&self, record: Arc<R>) {
        self.store::<R>().put_arc(record);
    }

    pub fn remove<R: Record>(&self, key: &R::Key) -> Option<Arc<R>> {
        self.store::<R>().remove(key)
    }

    pub fn stats<R: Record>(&self) -> CacheStats {
        self.store::<R>().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::{EntityType, GuildData, Optional, Snowflake};

    fn guild(id: u64, name: &str) -> GuildData {
        GuildData {
            id: Snowflake::new(id),
            name: name.to_string(),
            icon: None,
            owner_id: Snowflake::new(1),
            features: vec![],
            description: Optional::Missing,
            vanity_url_code: Optional::Missing,
            banner: Optional::Missing,
            splash: Optional::Missing,
            member_count: Optional::Missing,
        }
    }

    #[test]
    fn test_put_get_remove() {
        let cache = DataCache::default();
        cache.put(guild(7, "rust"));
        assert_eq!(cache.get::<GuildData>(&Snowflake::new(7)).unwrap().name, "rust");
        assert!(cache.remove::<GuildData>(&Snowflake::new(7)).is_some());
        assert!(cache.get::<GuildData>(&Snowflake::new(7)).is_none());
    }

    #[test]
    fn test_clones_share_stores() {
        let cache = DataCache::default();
        let other = cache.clone();
        other.put(guild(1, "shared"));
        assert!(cache.get::<GuildData>(&Snowflake::new(1)).is_some());
    }

    #[test]
    fn test_find_by_predicate() {
        let cache = DataCache::default();
        cache.put(guild(1, "alpha"));
        cache.put(guild(2, "beta"));
        let names: Vec<String> = cache
            .find::<GuildData, _>(|g| g.name.starts_with('b'))
            .map(|g| g.name.clone())
            .collect();
        assert_eq!(names, vec!["beta".to_string()]);
    }

    #[test]
    fn test_from_config_bounds_store() {
        let config = CacheConfig::new().with_lru(EntityType::Guild, 1);
        let cache = DataCache::from_config(&config).unwrap();
        cache.put(guild(1, "a"));
        cache.put(guild(2, "b"));
        assert_eq!(cache.stats::<GuildData>().entry_count, 1);
        assert_eq!(cache.stats::<GuildData>().evictions, 1);
    }
}
