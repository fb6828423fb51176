//! Concord Storage - Entity Access Layer
//!
//! A per-entity-type in-memory cache with pluggable eviction, two
//! interchangeable entity suppliers (cache and remote), strategies composing
//! them with fallback and write-back, lazy forward pagination, and entity
//! views bound to a strategy.

pub mod cache;
pub mod entity;
pub mod pagination;
pub mod strategy;
pub mod supplier;

pub use cache::{CacheStats, DataCache, EntryStore, EvictionPolicyRegistry, Record, StoreFactory};
pub use entity::{
    Ban, Channel, Guild, GuildEmoji, Member, Message, PartialGuild, Region, Role, ScheduledEvent,
    User, VoiceState,
};
pub use pagination::{paginate_forwards, ForwardPaginator};
pub use strategy::{CacheFirstSupplier, RemoteFirstSupplier, Resources, WriteBack};
pub use supplier::{
    empty_stream, failed_stream, CacheSupplier, EntityStream, EntitySupplier, MemberRecord,
    RemoteService, RemoteSupplier, Route, RouteParams,
};
