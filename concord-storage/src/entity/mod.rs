//! Entity views: a Record snapshot bound to a supply strategy.
//!
//! A view never refetches its own Record. Relation lookups (a member's guild,
//! a voice state's member) go through the supplier for the view's strategy.
//! `with_strategy` returns a new view over the same snapshot; nothing is
//! fetched until a relation is actually requested.

use crate::strategy::Resources;
use crate::supplier::{EntityStream, EntitySupplier};
use concord_core::{ConcordError, ConcordResult, EntitySupplyStrategy, EntityType, Snowflake};
use futures::StreamExt;
use std::sync::Arc;

/// Declares a view struct over `Arc<$data>` with the shared constructor and
/// strategy accessors.
macro_rules! view {
    ($(#[$meta:meta])* $name:ident => $data:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            data: std::sync::Arc<$data>,
            strategy: concord_core::EntitySupplyStrategy,
            resources: std::sync::Arc<$crate::strategy::Resources>,
        }

        impl $name {
            /// Bind `data` under the default strategy of `resources`.
            pub fn new(
                data: std::sync::Arc<$data>,
                resources: std::sync::Arc<$crate::strategy::Resources>,
            ) -> Self {
                let strategy = resources.default_strategy();
                Self::bound(data, strategy, resources)
            }

            pub fn bound(
                data: std::sync::Arc<$data>,
                strategy: concord_core::EntitySupplyStrategy,
                resources: std::sync::Arc<$crate::strategy::Resources>,
            ) -> Self {
                Self {
                    data,
                    strategy,
                    resources,
                }
            }

            pub fn data(&self) -> &$data {
                &self.data
            }

            pub fn strategy(&self) -> concord_core::EntitySupplyStrategy {
                self.strategy
            }

            pub fn resources(&self) -> &std::sync::Arc<$crate::strategy::Resources> {
                &self.resources
            }

            /// The same snapshot, resolving relations under `strategy`.
            pub fn with_strategy(&self, strategy: concord_core::EntitySupplyStrategy) -> Self {
                Self::bound(std::sync::Arc::clone(&self.data), strategy, std::sync::Arc::clone(&self.resources))
            }
        }

        impl $crate::entity::View for $name {
            fn bound_strategy(&self) -> concord_core::EntitySupplyStrategy {
                self.strategy
            }

            fn bound_resources(&self) -> &std::sync::Arc<$crate::strategy::Resources> {
                &self.resources
            }
        }
    };
}

pub(crate) use view;

mod channel;
mod guild;
mod user;

pub use channel::{Channel, Message};
pub use guild::{Ban, Guild, GuildEmoji, PartialGuild, Region, Role, ScheduledEvent};
pub use user::{Member, User, VoiceState};

/// Relation lookups shared by every view.
pub(crate) trait View {
    fn bound_strategy(&self) -> EntitySupplyStrategy;

    fn bound_resources(&self) -> &Arc<Resources>;

    /// The supplier for this view's strategy.
    fn supplier(&self) -> Arc<dyn EntitySupplier> {
        self.bound_resources().supply(self.bound_strategy())
    }

    /// Bind a related Record under this view's strategy.
    fn relate<T, V>(&self, data: T, bound: fn(T, EntitySupplyStrategy, Arc<Resources>) -> V) -> V {
        bound(data, self.bound_strategy(), Arc::clone(self.bound_resources()))
    }

    /// Bind every related Record of a stream under this view's strategy.
    fn relate_all<T, V>(
        &self,
        stream: EntityStream<T>,
        bound: fn(T, EntitySupplyStrategy, Arc<Resources>) -> V,
    ) -> EntityStream<V>
    where
        T: Send + 'static,
        V: Send + 'static,
    {
        let strategy = self.bound_strategy();
        let resources = Arc::clone(self.bound_resources());
        views(stream, move |data| bound(data, strategy, Arc::clone(&resources)))
    }
}

/// Wrap every item of `stream` into a view.
pub(crate) fn views<T, V, F>(stream: EntityStream<T>, wrap: F) -> EntityStream<V>
where
    T: Send + 'static,
    V: Send + 'static,
    F: Fn(T) -> V + Send + 'static,
{
    Box::pin(stream.map(move |item| item.map(&wrap)))
}

/// Turn an absent relation into `EntityNotFound`.
pub(crate) fn require<T>(found: Option<T>, entity_type: EntityType, id: Snowflake) -> ConcordResult<T> {
    found.ok_or(ConcordError::EntityNotFound { entity_type, id })
}

/// Entry points resolving top-level entities into views.
impl Resources {
    pub async fn guild(self: &Arc<Self>, guild_id: Snowflake) -> ConcordResult<Option<Guild>> {
        self.guild_with(guild_id, self.default_strategy()).await
    }

    pub async fn guild_with(
        self: &Arc<Self>,
        guild_id: Snowflake,
        strategy: EntitySupplyStrategy,
    ) -> ConcordResult<Option<Guild>> {
        let found = self.supply(strategy).get_guild(guild_id).await?;
        Ok(found.map(|data| Guild::bound(data, strategy, Arc::clone(self))))
    }

    pub async fn user(self: &Arc<Self>, user_id: Snowflake) -> ConcordResult<Option<User>> {
        let strategy = self.default_strategy();
        let found = self.supply(strategy).get_user(user_id).await?;
        Ok(found.map(|data| User::bound(data, strategy, Arc::clone(self))))
    }

    pub async fn channel(self: &Arc<Self>, channel_id: Snowflake) -> ConcordResult<Option<Channel>> {
        let strategy = self.default_strategy();
        let found = self.supply(strategy).get_channel(channel_id).await?;
        Ok(found.map(|data| Channel::bound(data, strategy, Arc::clone(self))))
    }

    /// The user the client is authenticated as.
    pub async fn current_user(self: &Arc<Self>) -> ConcordResult<Option<User>> {
        let strategy = self.default_strategy();
        let found = self.supply(strategy).get_self().await?;
        Ok(found.map(|data| User::bound(data, strategy, Arc::clone(self))))
    }

    /// Every guild the current user belongs to.
    pub fn guilds(self: &Arc<Self>) -> EntityStream<Guild> {
        let strategy = self.default_strategy();
        let resources = Arc::clone(self);
        views(self.supply(strategy).get_guilds(), move |data| {
            Guild::bound(data, strategy, Arc::clone(&resources))
        })
    }

    /// Partial guilds of the current user, always from the remote service.
    pub fn current_user_guilds(self: &Arc<Self>) -> EntityStream<PartialGuild> {
        let strategy = self.default_strategy();
        let resources = Arc::clone(self);
        views(self.remote().get_current_user_guilds(), move |data| {
            PartialGuild::bound(Arc::new(data), strategy, Arc::clone(&resources))
        })
    }

    /// Every voice region the platform offers.
    pub fn regions(self: &Arc<Self>) -> EntityStream<Region> {
        let strategy = self.default_strategy();
        let resources = Arc::clone(self);
        views(self.supply(strategy).get_regions(), move |data| {
            Region::bound(data, strategy, Arc::clone(&resources))
        })
    }
}
