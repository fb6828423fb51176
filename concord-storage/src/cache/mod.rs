//! In-memory Record cache with per-entity-type eviction.
//!
//! # Layers
//!
//! - [`EntryStore`] holds the Records of one type, unbounded or bounded-LRU
//! - [`EvictionPolicyRegistry`] builds one store per descriptor on first use
//! - [`DataCache`] is the typed, shareable facade over the registry
//!
//! The cache never performs I/O and never suspends. Absence is `None` or an
//! empty iterator, never an error.
//!
//! # Example
//!
//! ```ignore
//! let cache = DataCache::from_config(
//!     &CacheConfig::new().with_lru(EntityType::VoiceState, 500),
//! )?;
//! cache.put(voice_state);
//! let found = cache.get::<VoiceStateData>(&(guild_id, user_id));
//! ```

mod lock;

pub mod data_cache;
pub mod registry;
pub mod store;
pub mod traits;

pub use data_cache::DataCache;
pub use registry::EvictionPolicyRegistry;
pub use store::{EntryStore, StoreFactory};
pub use traits::{CacheStats, Record};
