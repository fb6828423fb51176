//! The entity retrieval contract and its two implementations.
//!
//! [`EntitySupplier`] is implemented by [`CacheSupplier`] (the in-memory
//! cache only) and [`RemoteSupplier`] (the remote service only). The strategy
//! layer composes the two.
//!
//! Single-entity operations return `Ok(None)` when the entity does not exist.
//! Collection operations return a lazy [`EntityStream`]; dropping the stream
//! cancels any remaining fetches.

mod cache;
mod remote;

pub use cache::CacheSupplier;
pub use remote::{RemoteService, RemoteSupplier, Route, RouteParams};

use async_trait::async_trait;
use concord_core::{
    BanData, ChannelData, ConcordError, ConcordResult, EmojiData, GuildData, MemberData,
    MessageData, ReactionEmoji, RegionData, RoleData, ScheduledEventData, Snowflake, UserData,
    WebhookData,
};
use futures::stream::{self, Stream};
use std::pin::Pin;
use std::sync::Arc;

/// Lazy, possibly remote-backed sequence of results.
pub type EntityStream<T> = Pin<Box<dyn Stream<Item = ConcordResult<T>> + Send + 'static>>;

/// A guild member joined with its user.
///
/// Never built from only one half: suppliers return `None` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    pub member: Arc<MemberData>,
    pub user: Arc<UserData>,
}

impl MemberRecord {
    pub fn guild_id(&self) -> Snowflake {
        self.member.guild_id
    }

    pub fn user_id(&self) -> Snowflake {
        self.member.user_id
    }
}

/// A stream that fails immediately with `error`.
pub fn failed_stream<T: Send + 'static>(error: ConcordError) -> EntityStream<T> {
    Box::pin(stream::once(async move { Err(error) }))
}

/// A stream with no items.
pub fn empty_stream<T: Send + 'static>() -> EntityStream<T> {
    Box::pin(stream::empty())
}

fn unsupported<T>(operation: &'static str) -> ConcordResult<T> {
    Err(ConcordError::Unsupported { operation })
}

/// Uniform entity retrieval, regardless of where the data comes from.
#[async_trait]
pub trait EntitySupplier: Send + Sync {
    async fn get_guild(&self, guild_id: Snowflake) -> ConcordResult<Option<Arc<GuildData>>>;

    /// Every guild the current user belongs to.
    fn get_guilds(&self) -> EntityStream<Arc<GuildData>>;

    async fn get_channel(&self, channel_id: Snowflake) -> ConcordResult<Option<Arc<ChannelData>>>;

    async fn get_user(&self, user_id: Snowflake) -> ConcordResult<Option<Arc<UserData>>>;

    /// The user the client is authenticated as.
    async fn get_self(&self) -> ConcordResult<Option<Arc<UserData>>>;

    async fn get_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ConcordResult<Option<MemberRecord>>;

    fn get_guild_members(&self, guild_id: Snowflake) -> EntityStream<MemberRecord>;

    async fn get_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> ConcordResult<Option<Arc<MessageData>>>;

    async fn get_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
    ) -> ConcordResult<Option<Arc<RoleData>>>;

    fn get_guild_roles(&self, guild_id: Snowflake) -> EntityStream<Arc<RoleData>>;

    async fn get_guild_ban(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ConcordResult<Option<Arc<BanData>>>;

    fn get_guild_bans(&self, guild_id: Snowflake) -> EntityStream<Arc<BanData>>;

    /// Every voice region the platform offers.
    fn get_regions(&self) -> EntityStream<Arc<RegionData>>;

    /// Voice regions available to one guild.
    fn get_guild_voice_regions(&self, guild_id: Snowflake) -> EntityStream<Arc<RegionData>>;

    /// Users who reacted to a message with `emoji`.
    fn get_reactors(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: ReactionEmoji,
    ) -> EntityStream<Arc<UserData>>;

    async fn get_scheduled_event(
        &self,
        guild_id: Snowflake,
        event_id: Snowflake,
    ) -> ConcordResult<Option<Arc<ScheduledEventData>>>;

    // ------------------------------------------------------------------------
    // Declared but not implemented by either supplier.
    // ------------------------------------------------------------------------

    fn get_messages_before(
        &self,
        _channel_id: Snowflake,
        _before: Snowflake,
        _limit: usize,
    ) -> EntityStream<Arc<MessageData>> {
        failed_stream(ConcordError::Unsupported {
            operation: "get_messages_before",
        })
    }

    fn get_messages_after(
        &self,
        _channel_id: Snowflake,
        _after: Snowflake,
        _limit: usize,
    ) -> EntityStream<Arc<MessageData>> {
        failed_stream(ConcordError::Unsupported {
            operation: "get_messages_after",
        })
    }

    fn get_messages_around(
        &self,
        _channel_id: Snowflake,
        _around: Snowflake,
        _limit: usize,
    ) -> EntityStream<Arc<MessageData>> {
        failed_stream(ConcordError::Unsupported {
            operation: "get_messages_around",
        })
    }

    fn get_pinned_messages(&self, _channel_id: Snowflake) -> EntityStream<Arc<MessageData>> {
        failed_stream(ConcordError::Unsupported {
            operation: "get_pinned_messages",
        })
    }

    fn get_channel_webhooks(&self, _channel_id: Snowflake) -> EntityStream<Arc<WebhookData>> {
        failed_stream(ConcordError::Unsupported {
            operation: "get_channel_webhooks",
        })
    }

    fn get_guild_webhooks(&self, _guild_id: Snowflake) -> EntityStream<Arc<WebhookData>> {
        failed_stream(ConcordError::Unsupported {
            operation: "get_guild_webhooks",
        })
    }

    async fn get_webhook(&self, _webhook_id: Snowflake) -> ConcordResult<Option<Arc<WebhookData>>> {
        unsupported("get_webhook")
    }

    async fn get_emoji(
        &self,
        _guild_id: Snowflake,
        _emoji_id: Snowflake,
    ) -> ConcordResult<Option<Arc<EmojiData>>> {
        unsupported("get_emoji")
    }

    fn get_emojis(&self, _guild_id: Snowflake) -> EntityStream<Arc<EmojiData>> {
        failed_stream(ConcordError::Unsupported {
            operation: "get_emojis",
        })
    }
}
