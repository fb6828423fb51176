//! Retrieval served from the in-memory cache alone.

use super::{empty_stream, EntityStream, EntitySupplier, MemberRecord};
use crate::cache::DataCache;
use async_trait::async_trait;
use concord_core::{
    BanData, ChannelData, ConcordResult, GuildData, MemberData, MessageData, ReactionEmoji,
    RegionData, RoleData, ScheduledEventData, Snowflake, UserData,
};
use futures::stream;
use std::sync::Arc;

/// [`EntitySupplier`] over a [`DataCache`].
///
/// Never performs I/O. Collection results reflect only what happens to be
/// cached and never claim completeness.
#[derive(Debug, Clone)]
pub struct CacheSupplier {
    cache: DataCache,
    self_id: Option<Snowflake>,
}

impl CacheSupplier {
    pub fn new(cache: DataCache) -> Self {
        Self {
            cache,
            self_id: None,
        }
    }

    /// Id of the authenticated user, used by `get_self`.
    pub fn with_self_id(mut self, self_id: Option<Snowflake>) -> Self {
        self.self_id = self_id;
        self
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    /// Ids of users that reacted to a cached message with `emoji`.
    ///
    /// Empty when the message is not cached or has no such reaction. The ids
    /// are not resolved to users.
    pub fn reactor_ids(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &ReactionEmoji,
    ) -> Vec<Snowflake> {
        self.cache
            .get::<MessageData>(&(channel_id, message_id))
            .and_then(|message| message.reaction(emoji).map(|r| r.user_ids.clone()))
            .unwrap_or_default()
    }

    fn snapshot<R, P>(&self, predicate: P) -> EntityStream<Arc<R>>
    where
        R: crate::cache::Record,
        P: FnMut(&R) -> bool + Send + 'static,
    {
        Box::pin(stream::iter(self.cache.find(predicate).map(Ok)))
    }
}

#[async_trait]
impl EntitySupplier for CacheSupplier {
    async fn get_guild(&self, guild_id: Snowflake) -> ConcordResult<Option<Arc<GuildData>>> {
        Ok(self.cache.get::<GuildData>(&guild_id))
    }

    fn get_guilds(&self) -> EntityStream<Arc<GuildData>> {
        self.snapshot::<GuildData, _>(|_| true)
    }

    async fn get_channel(&self, channel_id: Snowflake) -> ConcordResult<Option<Arc<ChannelData>>> {
        Ok(self.cache.get::<ChannelData>(&channel_id))
    }

    async fn get_user(&self, user_id: Snowflake) -> ConcordResult<Option<Arc<UserData>>> {
        Ok(self.cache.get::<UserData>(&user_id))
    }

    async fn get_self(&self) -> ConcordResult<Option<Arc<UserData>>> {
        Ok(self
            .self_id
            .and_then(|self_id| self.cache.get::<UserData>(&self_id)))
    }

    async fn get_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ConcordResult<Option<MemberRecord>> {
        let Some(user) = self.cache.get::<UserData>(&user_id) else {
            return Ok(None);
        };
        let Some(member) = self.cache.get::<MemberData>(&(guild_id, user_id)) else {
            return Ok(None);
        };
        Ok(Some(MemberRecord { member, user }))
    }

    fn get_guild_members(&self, guild_id: Snowflake) -> EntityStream<MemberRecord> {
        let cache = self.cache.clone();
        let joined = self.cache.find::<UserData, _>(|_| true).filter_map(move |user| {
            cache
                .get::<MemberData>(&(guild_id, user.id))
                .map(|member| Ok(MemberRecord { member, user }))
        });
        Box::pin(stream::iter(joined))
    }

    async fn get_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> ConcordResult<Option<Arc<MessageData>>> {
        Ok(self.cache.get::<MessageData>(&(channel_id, message_id)))
    }

    async fn get_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
    ) -> ConcordResult<Option<Arc<RoleData>>> {
        Ok(self.cache.get::<RoleData>(&(guild_id, role_id)))
    }

    fn get_guild_roles(&self, guild_id: Snowflake) -> EntityStream<Arc<RoleData>> {
        self.snapshot::<RoleData, _>(move |role| role.guild_id == guild_id)
    }

    async fn get_guild_ban(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ConcordResult<Option<Arc<BanData>>> {
        Ok(self.cache.get::<BanData>(&(guild_id, user_id)))
    }

    fn get_guild_bans(&self, guild_id: Snowflake) -> EntityStream<Arc<BanData>> {
        self.snapshot::<BanData, _>(move |ban| ban.guild_id == guild_id)
    }

    fn get_regions(&self) -> EntityStream<Arc<RegionData>> {
        self.snapshot::<RegionData, _>(|_| true)
    }

    fn get_guild_voice_regions(&self, _guild_id: Snowflake) -> EntityStream<Arc<RegionData>> {
        // Regions are cached without a guild association.
        empty_stream()
    }

    fn get_reactors(
        &self,
        _channel_id: Snowflake,
        _message_id: Snowflake,
        _emoji: ReactionEmoji,
    ) -> EntityStream<Arc<UserData>> {
        // Reactor ids are available through `reactor_ids`; resolving them to
        // users is left to the caller.
        empty_stream()
    }

    async fn get_scheduled_event(
        &self,
        guild_id: Snowflake,
        event_id: Snowflake,
    ) -> ConcordResult<Option<Arc<ScheduledEventData>>> {
        Ok(self
            .cache
            .get::<ScheduledEventData>(&event_id)
            .filter(|event| event.guild_id == guild_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use concord_core::{ConcordError, Optional, ReactionData};
    use futures::TryStreamExt;

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

    fn message(channel: u64, id: u64, reactions: Vec<ReactionData>) -> MessageData {
        MessageData {
            id: Snowflake::new(id),
            channel_id: Snowflake::new(channel),
            guild_id: Optional::Missing,
            author: user(1),
            content: "hi".to_string(),
            timestamp: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            edited_timestamp: None,
            pinned: false,
            reactions,
        }
    }

    fn supplier() -> CacheSupplier {
        CacheSupplier::new(DataCache::default())
    }

    #[tokio::test]
    async fn test_member_requires_both_halves() {
        let supplier = supplier();
        supplier.cache().put(user(5));
        let found = supplier
            .get_member(Snowflake::new(1), Snowflake::new(5))
            .await
            .unwrap();
        assert!(found.is_none());

        supplier.cache().put(member(1, 5));
        let found = supplier
            .get_member(Snowflake::new(1), Snowflake::new(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.user.id, Snowflake::new(5));
        assert_eq!(found.guild_id(), Snowflake::new(1));
    }

    #[tokio::test]
    async fn test_member_without_user_is_none() {
        let supplier = supplier();
        supplier.cache().put(member(1, 5));
        let found = supplier
            .get_member(Snowflake::new(1), Snowflake::new(5))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_guild_members_joins_cached_users() {
        let supplier = supplier();
        supplier.cache().put(user(1));
        supplier.cache().put(user(2));
        supplier.cache().put(user(3));
        supplier.cache().put(member(9, 1));
        supplier.cache().put(member(9, 3));
        supplier.cache().put(member(8, 2));

        let mut ids: Vec<u64> = supplier
            .get_guild_members(Snowflake::new(9))
            .map_ok(|m| m.user_id().value())
            .try_collect()
            .await
            .unwrap();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_reactor_ids_extracted_from_message() {
        let supplier = supplier();
        let fire = ReactionEmoji::Unicode {
            name: "🔥".to_string(),
        };
        supplier.cache().put(message(
            4,
            40,
            vec![ReactionData {
                emoji: fire.clone(),
                count: 2,
                me: false,
                user_ids: vec![Snowflake::new(7), Snowflake::new(8)],
            }],
        ));

        let ids = supplier.reactor_ids(Snowflake::new(4), Snowflake::new(40), &fire);
        assert_eq!(ids, vec![Snowflake::new(7), Snowflake::new(8)]);

        let reactors: Vec<_> = supplier
            .get_reactors(Snowflake::new(4), Snowflake::new(40), fire.clone())
            .try_collect()
            .await
            .unwrap();
        assert!(reactors.is_empty());

        assert!(supplier
            .reactor_ids(Snowflake::new(4), Snowflake::new(41), &fire)
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_self_uses_configured_id() {
        let supplier = supplier().with_self_id(Some(Snowflake::new(2)));
        assert!(supplier.get_self().await.unwrap().is_none());
        supplier.cache().put(user(2));
        assert_eq!(
            supplier.get_self().await.unwrap().map(|u| u.id),
            Some(Snowflake::new(2))
        );
    }

    #[tokio::test]
    async fn test_guild_voice_regions_is_empty() {
        let supplier = supplier();
        supplier.cache().put(RegionData {
            id: "eu-west".to_string(),
            name: "EU West".to_string(),
            optimal: true,
            deprecated: false,
            custom: false,
        });
        let guild_regions: Vec<_> = supplier
            .get_guild_voice_regions(Snowflake::new(1))
            .try_collect()
            .await
            .unwrap();
        assert!(guild_regions.is_empty());
        let regions: Vec<_> = supplier.get_regions().try_collect().await.unwrap();
        assert_eq!(regions.len(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_operations_are_unsupported() {
        let supplier = supplier();
        let err = supplier
            .get_emoji(Snowflake::new(1), Snowflake::new(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ConcordError::Unsupported { operation: "get_emoji" }));

        let err = supplier
            .get_pinned_messages(Snowflake::new(1))
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(err.is_unsupported());
    }
}
