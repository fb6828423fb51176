//! Eviction policy registry.
//!
//! Maps each entity-type descriptor to a store factory and lazily builds, then
//! memoizes, exactly one store per descriptor.

use super::lock::{rw_read, rw_write};
use super::store::{EntryStore, StoreFactory};
use super::traits::Record;
use concord_core::{CacheConfig, ConfigError, EntityType, EvictionPolicy};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const SOURCE: &str = "cache::registry";

type AnyStore = Arc<dyn Any + Send + Sync>;

/// Registry of per-descriptor store factories and the stores built from them.
///
/// Factories can only be changed through `&mut self`; once the registry is
/// shared (usually inside a [`DataCache`](super::DataCache)) its configuration
/// is fixed and only store resolution remains.
pub struct EvictionPolicyRegistry {
    default_factory: StoreFactory,
    factories: HashMap<EntityType, StoreFactory>,
    stores: RwLock<HashMap<EntityType, AnyStore>>,
}

impl Default for EvictionPolicyRegistry {
    fn default() -> Self {
        Self {
            default_factory: StoreFactory::Unbounded,
            factories: HashMap::new(),
            stores: RwLock::new(HashMap::new()),
        }
    }
}

impl EvictionPolicyRegistry {
    /// A registry where every descriptor is unbounded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration, validating every policy.
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for entity_type in EntityType::ALL {
            let policy = config.policy_for(entity_type);
            if policy != EvictionPolicy::Unbounded {
                registry.register(entity_type, policy)?;
            }
        }
        Ok(registry)
    }

    /// Set the factory for `entity_type`.
    ///
    /// A store already resolved for `entity_type` keeps its original policy.
    pub fn register(&mut self, entity_type: EntityType, policy: EvictionPolicy) -> Result<(), ConfigError> {
        let factory = StoreFactory::from_policy(entity_type, policy)?;
        self.factories.insert(entity_type, factory);
        Ok(())
    }

    /// Revert `entity_type` to the default (unbounded) factory.
    pub fn unregister(&mut self, entity_type: EntityType) {
        self.factories.remove(&entity_type);
    }

    /// The factory that a not-yet-resolved `entity_type` would use.
    pub fn factory_for(&self, entity_type: EntityType) -> StoreFactory {
        self.factories
            .get(&entity_type)
            .copied()
            .unwrap_or(self.default_factory)
    }

    /// Returns true if a store has been built for `entity_type`.
    pub fn is_resolved(&self, entity_type: EntityType) -> bool {
        rw_read(&self.stores, SOURCE, "is_resolved").contains_key(&entity_type)
    }

    /// The store for `R`, built on first use and memoized thereafter.
    ///
    /// # Panics
    ///
    /// If a store memoized under `R::ENTITY_TYPE` holds a different Record
    /// type. Every descriptor must belong to exactly one Record type.
    pub fn resolve<R: Record>(&self) -> Arc<EntryStore<R>> {
        let existing = rw_read(&self.stores, SOURCE, "resolve")
            .get(&R::ENTITY_TYPE)
            .cloned();
        let store = match existing {
            Some(store) => store,
            None => {
                let mut stores = rw_write(&self.stores, SOURCE, "resolve");
                let factory = self.factory_for(R::ENTITY_TYPE);
                Arc::clone(stores.entry(R::ENTITY_TYPE).or_insert_with(|| {
                    tracing::trace!(
                        entity_type = %R::ENTITY_TYPE,
                        factory = ?factory,
                        "Materialized entry store"
                    );
                    Arc::new(factory.build::<R>()) as AnyStore
                }))
            }
        };
        match store.downcast::<EntryStore<R>>() {
            Ok(store) => store,
            Err(_) => panic!(
                "entry store for {} does not hold {}",
                R::ENTITY_TYPE,
                std::any::type_name::<R>()
            ),
        }
    }
}

impl std::fmt::Debug for EvictionPolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let resolved: Vec<EntityType> = rw_read(&self.stores, SOURCE, "debug")
            .keys()
            .copied()
            .collect();
        f.debug_struct("EvictionPolicyRegistry")
            .field("default_factory", &self.default_factory)
            .field("factories", &self.factories)
            .field("resolved", &resolved)
            .finish()
    }
}
