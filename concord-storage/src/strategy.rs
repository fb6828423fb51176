//! Supply strategies: composing the cache and remote suppliers.
//!
//! - `CacheOnly` and `RemoteOnly` use one supplier as-is
//! - [`CacheFirstSupplier`] serves from the cache and falls back to the remote
//!   service on a miss
//! - [`RemoteFirstSupplier`] serves from the remote service and falls back to
//!   the cache on a failure or a not-found
//!
//! Both composites write every remote result into the cache before handing it
//! to the caller, so an immediately following cache-only read observes it.
//! Cache and remote results for one query are never merged.

use crate::cache::{DataCache, Record};
use crate::supplier::{
    CacheSupplier, EntityStream, EntitySupplier, MemberRecord, RemoteService, RemoteSupplier,
};
use async_stream::stream;
use async_trait::async_trait;
use concord_core::{
    BanData, ChannelData, ClientConfig, ConcordResult, EntitySupplyStrategy,
    GuildData, MessageData, ReactionEmoji, RegionData, RoleData, ScheduledEventData, Snowflake,
    UserData,
};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// WRITE-BACK
// ============================================================================

/// A remote result that can be stored in the cache.
pub trait WriteBack: Send + 'static {
    fn write_back(&self, cache: &DataCache);
}

impl<R: Record> WriteBack for Arc<R> {
    fn write_back(&self, cache: &DataCache) {
        cache.put_arc(Arc::clone(self));
    }
}

impl WriteBack for MemberRecord {
    fn write_back(&self, cache: &DataCache) {
        cache.put_arc(Arc::clone(&self.user));
        cache.put_arc(Arc::clone(&self.member));
    }
}

// ============================================================================
// COMPOSITION HELPERS
// ============================================================================

async fn cache_first<T, C, F, Fut>(
    operation: &'static str,
    cache: &DataCache,
    from_cache: C,
    from_remote: F,
) -> ConcordResult<Option<T>>
where
    T: WriteBack,
    C: Future<Output = ConcordResult<Option<T>>>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ConcordResult<Option<T>>>,
{
    match from_cache.await {
        Ok(Some(value)) => return Ok(Some(value)),
        Ok(None) => {}
        Err(e) if e.is_unsupported() => {}
        Err(e) => return Err(e),
    }
    tracing::debug!(operation, "Cache miss, falling back to remote");
    let fetched = from_remote().await?;
    if let Some(value) = &fetched {
        value.write_back(cache);
        tracing::debug!(operation, "Wrote remote result back to cache");
    }
    Ok(fetched)
}

async fn remote_first<T, R, F, Fut>(
    operation: &'static str,
    cache: &DataCache,
    from_remote: R,
    from_cache: F,
) -> ConcordResult<Option<T>>
where
    T: WriteBack,
    R: Future<Output = ConcordResult<Option<T>>>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ConcordResult<Option<T>>>,
{
    let remote_error = match from_remote.await {
        Ok(Some(value)) => {
            value.write_back(cache);
            return Ok(Some(value));
        }
        // Not-found was absorbed by the remote supplier; it is still a miss.
        Ok(None) => None,
        Err(e) => Some(e),
    };
    match &remote_error {
        Some(e) => tracing::debug!(operation, error = %e, "Remote failed, falling back to cache"),
        None => tracing::debug!(operation, "Remote not found, falling back to cache"),
    }
    match (from_cache().await?, remote_error) {
        (Some(value), _) => Ok(Some(value)),
        // Nothing cached: the remote failure is the last one encountered.
        (None, Some(e)) => Err(e),
        (None, None) => Ok(None),
    }
}

fn cache_first_stream<T, F>(
    operation: &'static str,
    cache: DataCache,
    from_cache: EntityStream<T>,
    from_remote: F,
) -> EntityStream<T>
where
    T: WriteBack,
    F: FnOnce() -> EntityStream<T> + Send + 'static,
{
    Box::pin(stream! {
        let mut cached = from_cache;
        let mut emitted = false;
        while let Some(item) = cached.next().await {
            match item {
                Ok(value) => {
                    emitted = true;
                    yield Ok(value);
                }
                Err(e) if e.is_unsupported() && !emitted => break,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
        if emitted {
            return;
        }

        tracing::debug!(operation, "Cache empty, falling back to remote");
        let mut remote = from_remote();
        while let Some(item) = remote.next().await {
            match item {
                Ok(value) => {
                    value.write_back(&cache);
                    yield Ok(value);
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    })
}

fn remote_first_stream<T, F>(
    operation: &'static str,
    cache: DataCache,
    from_remote: EntityStream<T>,
    from_cache: F,
) -> EntityStream<T>
where
    T: WriteBack,
    F: FnOnce() -> EntityStream<T> + Send + 'static,
{
    Box::pin(stream! {
        let mut remote = from_remote;
        let mut emitted = false;
        let mut remote_error = None;
        while let Some(item) = remote.next().await {
            match item {
                Ok(value) => {
                    emitted = true;
                    value.write_back(&cache);
                    yield Ok(value);
                }
                Err(e) if !emitted => {
                    remote_error = Some(e);
                    break;
                }
                Err(e) => {
                    // Items already went out; falling back now would merge
                    // two sources into one result.
                    yield Err(e);
                    return;
                }
            }
        }
        if emitted {
            return;
        }

        match &remote_error {
            Some(e) => tracing::debug!(operation, error = %e, "Remote failed, falling back to cache"),
            None => tracing::debug!(operation, "Remote listing empty, falling back to cache"),
        }
        let mut cached = from_cache();
        let mut found = false;
        while let Some(item) = cached.next().await {
            match item {
                Ok(value) => {
                    found = true;
                    yield Ok(value);
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
        if !found {
            if let Some(e) = remote_error {
                yield Err(e);
            }
        }
    })
}

// ============================================================================
// COMPOSITE SUPPLIERS
// ============================================================================

/// Cache first; on a miss, the remote service, writing the result back.
///
/// A cached empty collection counts as a miss and is replaced wholesale by
/// the remote listing. An `Unsupported` cache operation also counts as a miss.
#[derive(Debug, Clone)]
pub struct CacheFirstSupplier {
    cache: CacheSupplier,
    remote: RemoteSupplier,
}

impl CacheFirstSupplier {
    pub fn new(cache: CacheSupplier, remote: RemoteSupplier) -> Self {
        Self { cache, remote }
    }

    fn data(&self) -> &DataCache {
        self.cache.cache()
    }
}

/// Remote service first, writing results back; on any failure, the cache.
///
/// Not-found counts as a failure here: an absent remote entity or an empty
/// remote listing is answered from the cache. Collection operations fall back
/// only if the remote listing yields nothing before failing or ending.
#[derive(Debug, Clone)]
pub struct RemoteFirstSupplier {
    remote: RemoteSupplier,
    cache: CacheSupplier,
}

impl RemoteFirstSupplier {
    pub fn new(remote: RemoteSupplier, cache: CacheSupplier) -> Self {
        Self { remote, cache }
    }

    fn data(&self) -> &DataCache {
        self.cache.cache()
    }
}

/// Implements [`EntitySupplier`] for a composite by routing every operation
/// through the given single-value and stream combinators.
macro_rules! composite_supplier {
    ($name:ident, $single:ident, $streamed:ident, $first:ident, $second:ident) => {
        #[async_trait]
        impl EntitySupplier for $name {
            async fn get_guild(&self, guild_id: Snowflake) -> ConcordResult<Option<Arc<GuildData>>> {
                $single("get_guild", self.data(), self.$first.get_guild(guild_id), || {
                    self.$second.get_guild(guild_id)
                })
                .await
            }

            fn get_guilds(&self) -> EntityStream<Arc<GuildData>> {
                let second = self.$second.clone();
                $streamed("get_guilds", self.data().clone(), self.$first.get_guilds(), move || {
                    second.get_guilds()
                })
            }

            async fn get_channel(
                &self,
                channel_id: Snowflake,
            ) -> ConcordResult<Option<Arc<ChannelData>>> {
                $single("get_channel", self.data(), self.$first.get_channel(channel_id), || {
                    self.$second.get_channel(channel_id)
                })
                .await
            }

            async fn get_user(&self, user_id: Snowflake) -> ConcordResult<Option<Arc<UserData>>> {
                $single("get_user", self.data(), self.$first.get_user(user_id), || {
                    self.$second.get_user(user_id)
                })
                .await
            }

            async fn get_self(&self) -> ConcordResult<Option<Arc<UserData>>> {
                $single("get_self", self.data(), self.$first.get_self(), || {
                    self.$second.get_self()
                })
                .await
            }

            async fn get_member(
                &self,
                guild_id: Snowflake,
                user_id: Snowflake,
            ) -> ConcordResult<Option<MemberRecord>> {
                $single(
                    "get_member",
                    self.data(),
                    self.$first.get_member(guild_id, user_id),
                    || self.$second.get_member(guild_id, user_id),
                )
                .await
            }

            fn get_guild_members(&self, guild_id: Snowflake) -> EntityStream<MemberRecord> {
                let second = self.$second.clone();
                $streamed(
                    "get_guild_members",
                    self.data().clone(),
                    self.$first.get_guild_members(guild_id),
                    move || second.get_guild_members(guild_id),
                )
            }

            async fn get_message(
                &self,
                channel_id: Snowflake,
                message_id: Snowflake,
            ) -> ConcordResult<Option<Arc<MessageData>>> {
                $single(
                    "get_message",
                    self.data(),
                    self.$first.get_message(channel_id, message_id),
                    || self.$second.get_message(channel_id, message_id),
                )
                .await
            }

            async fn get_role(
                &self,
                guild_id: Snowflake,
                role_id: Snowflake,
            ) -> ConcordResult<Option<Arc<RoleData>>> {
                $single(
                    "get_role",
                    self.data(),
                    self.$first.get_role(guild_id, role_id),
                    || self.$second.get_role(guild_id, role_id),
                )
                .await
            }

            fn get_guild_roles(&self, guild_id: Snowflake) -> EntityStream<Arc<RoleData>> {
                let second = self.$second.clone();
                $streamed(
                    "get_guild_roles",
                    self.data().clone(),
                    self.$first.get_guild_roles(guild_id),
                    move || second.get_guild_roles(guild_id),
                )
            }

            async fn get_guild_ban(
                &self,
                guild_id: Snowflake,
                user_id: Snowflake,
            ) -> ConcordResult<Option<Arc<BanData>>> {
                $single(
                    "get_guild_ban",
                    self.data(),
                    self.$first.get_guild_ban(guild_id, user_id),
                    || self.$second.get_guild_ban(guild_id, user_id),
                )
                .await
            }

            fn get_guild_bans(&self, guild_id: Snowflake) -> EntityStream<Arc<BanData>> {
                let second = self.$second.clone();
                $streamed(
                    "get_guild_bans",
                    self.data().clone(),
                    self.$first.get_guild_bans(guild_id),
                    move || second.get_guild_bans(guild_id),
                )
            }

            fn get_regions(&self) -> EntityStream<Arc<RegionData>> {
                let second = self.$second.clone();
                $streamed("get_regions", self.data().clone(), self.$first.get_regions(), move || {
                    second.get_regions()
                })
            }

            fn get_guild_voice_regions(&self, guild_id: Snowflake) -> EntityStream<Arc<RegionData>> {
                let second = self.$second.clone();
                $streamed(
                    "get_guild_voice_regions",
                    self.data().clone(),
                    self.$first.get_guild_voice_regions(guild_id),
                    move || second.get_guild_voice_regions(guild_id),
                )
            }

            fn get_reactors(
                &self,
                channel_id: Snowflake,
                message_id: Snowflake,
                emoji: ReactionEmoji,
            ) -> EntityStream<Arc<UserData>> {
                let second = self.$second.clone();
                let first = self.$first.get_reactors(channel_id, message_id, emoji.clone());
                $streamed("get_reactors", self.data().clone(), first, move || {
                    second.get_reactors(channel_id, message_id, emoji)
                })
            }

            async fn get_scheduled_event(
                &self,
                guild_id: Snowflake,
                event_id: Snowflake,
            ) -> ConcordResult<Option<Arc<ScheduledEventData>>> {
                $single(
                    "get_scheduled_event",
                    self.data(),
                    self.$first.get_scheduled_event(guild_id, event_id),
                    || self.$second.get_scheduled_event(guild_id, event_id),
                )
                .await
            }
        }
    };
}

composite_supplier!(CacheFirstSupplier, cache_first, cache_first_stream, cache, remote);
composite_supplier!(RemoteFirstSupplier, remote_first, remote_first_stream, remote, cache);

// ============================================================================
// RESOURCES
// ============================================================================

/// Everything an entity view needs to resolve relations: the cache, the
/// remote supplier, the authenticated user's id and the default strategy.
#[derive(Debug, Clone)]
pub struct Resources {
    cache: DataCache,
    remote: RemoteSupplier,
    self_id: Option<Snowflake>,
    default_strategy: EntitySupplyStrategy,
}

impl Resources {
    pub fn new(
        cache: DataCache,
        remote: RemoteSupplier,
        self_id: Option<Snowflake>,
        default_strategy: EntitySupplyStrategy,
    ) -> Self {
        Self {
            cache,
            remote,
            self_id,
            default_strategy,
        }
    }

    /// Build from validated configuration.
    pub fn from_config(config: &ClientConfig, service: Arc<dyn RemoteService>) -> ConcordResult<Self> {
        config.validate()?;
        let cache = DataCache::from_config(&config.cache)?;
        let remote = RemoteSupplier::new(service, config.remote)?;
        Ok(Self::new(cache, remote, config.self_id, config.default_strategy))
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn remote(&self) -> &RemoteSupplier {
        &self.remote
    }

    pub fn self_id(&self) -> Option<Snowflake> {
        self.self_id
    }

    pub fn default_strategy(&self) -> EntitySupplyStrategy {
        self.default_strategy
    }

    pub fn cache_supplier(&self) -> CacheSupplier {
        CacheSupplier::new(self.cache.clone()).with_self_id(self.self_id)
    }

    /// The supplier implementing `strategy`.
    pub fn supply(&self, strategy: EntitySupplyStrategy) -> Arc<dyn EntitySupplier> {
        match strategy {
            EntitySupplyStrategy::CacheOnly => Arc::new(self.cache_supplier()),
            EntitySupplyStrategy::RemoteOnly => Arc::new(self.remote.clone()),
            EntitySupplyStrategy::CacheWithRemoteFallback => Arc::new(CacheFirstSupplier::new(
                self.cache_supplier(),
                self.remote.clone(),
            )),
            EntitySupplyStrategy::RemoteWithCacheFallback => Arc::new(RemoteFirstSupplier::new(
                self.remote.clone(),
                self.cache_supplier(),
            )),
        }
    }

    /// The supplier for the default strategy.
    pub fn supplier(&self) -> Arc<dyn EntitySupplier> {
        self.supply(self.default_strategy)
    }
}
