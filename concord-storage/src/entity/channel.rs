//! Channel and message views.

use super::{require, view, Guild, User, View};
use crate::supplier::EntityStream;
use concord_core::{
    ChannelData, ChannelType, ConcordResult, EntityType, MessageData, ReactionEmoji, Snowflake,
    WebhookData,
};
use std::sync::Arc;

view! {
    Channel => ChannelData
}

impl Channel {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub fn kind(&self) -> ChannelType {
        self.data.kind
    }

    pub fn guild_id(&self) -> Option<Snowflake> {
        self.data.guild_id.value().copied()
    }

    /// The owning guild; `None` for direct-message channels.
    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let Some(guild_id) = self.guild_id() else {
            return Ok(None);
        };
        let found = self.supplier().get_guild(guild_id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }

    pub async fn get_message(&self, message_id: Snowflake) -> ConcordResult<Message> {
        require(self.get_message_or_null(message_id).await?, EntityType::Message, message_id)
    }

    pub async fn get_message_or_null(&self, message_id: Snowflake) -> ConcordResult<Option<Message>> {
        let found = self.supplier().get_message(self.data.id, message_id).await?;
        Ok(found.map(|message| self.relate(message, Message::bound)))
    }

    pub fn messages_before(&self, before: Snowflake, limit: usize) -> EntityStream<Message> {
        let messages = self.supplier().get_messages_before(self.data.id, before, limit);
        self.relate_all(messages, Message::bound)
    }

    pub fn messages_after(&self, after: Snowflake, limit: usize) -> EntityStream<Message> {
        let messages = self.supplier().get_messages_after(self.data.id, after, limit);
        self.relate_all(messages, Message::bound)
    }

    pub fn messages_around(&self, around: Snowflake, limit: usize) -> EntityStream<Message> {
        let messages = self.supplier().get_messages_around(self.data.id, around, limit);
        self.relate_all(messages, Message::bound)
    }

    pub fn pinned_messages(&self) -> EntityStream<Message> {
        self.relate_all(self.supplier().get_pinned_messages(self.data.id), Message::bound)
    }

    pub fn webhooks(&self) -> EntityStream<Arc<WebhookData>> {
        self.supplier().get_channel_webhooks(self.data.id)
    }
}

view! {
    Message => MessageData
}

impl Message {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub fn channel_id(&self) -> Snowflake {
        self.data.channel_id
    }

    pub fn content(&self) -> &str {
        &self.data.content
    }

    /// The author as embedded in the message snapshot.
    pub fn author(&self) -> User {
        self.relate(Arc::new(self.data.author.clone()), User::bound)
    }

    pub async fn get_channel(&self) -> ConcordResult<Channel> {
        require(self.get_channel_or_null().await?, EntityType::Channel, self.data.channel_id)
    }

    pub async fn get_channel_or_null(&self) -> ConcordResult<Option<Channel>> {
        let found = self.supplier().get_channel(self.data.channel_id).await?;
        Ok(found.map(|channel| self.relate(channel, Channel::bound)))
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let Some(guild_id) = self.data.guild_id.value().copied() else {
            return Ok(None);
        };
        let found = self.supplier().get_guild(guild_id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }

    /// Users who reacted with `emoji`.
    pub fn reactors(&self, emoji: ReactionEmoji) -> EntityStream<User> {
        let reactors = self
            .supplier()
            .get_reactors(self.data.channel_id, self.data.id, emoji);
        self.relate_all(reactors, User::bound)
    }
}
