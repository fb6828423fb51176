//! Guild-scoped views.

use super::{require, view, Member, User, View};
use crate::supplier::EntityStream;
use concord_core::{
    BanData, ConcordResult, EmojiData, EntityType, GuildData, PartialGuildData, RegionData,
    RoleData, ScheduledEventData, Snowflake, WebhookData,
};
use futures::StreamExt;
use std::sync::Arc;

view! {
    /// A guild.
    Guild => GuildData
}

impl Guild {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn owner_id(&self) -> Snowflake {
        self.data.owner_id
    }

    pub async fn get_owner(&self) -> ConcordResult<User> {
        require(self.get_owner_or_null().await?, EntityType::User, self.data.owner_id)
    }

    pub async fn get_owner_or_null(&self) -> ConcordResult<Option<User>> {
        let found = self.supplier().get_user(self.data.owner_id).await?;
        Ok(found.map(|user| self.relate(user, User::bound)))
    }

    pub async fn get_member(&self, user_id: Snowflake) -> ConcordResult<Member> {
        require(self.get_member_or_null(user_id).await?, EntityType::Member, user_id)
    }

    pub async fn get_member_or_null(&self, user_id: Snowflake) -> ConcordResult<Option<Member>> {
        let found = self.supplier().get_member(self.data.id, user_id).await?;
        Ok(found.map(|record| self.relate(record, Member::from_record)))
    }

    /// The authenticated user's membership, if the client knows its own id.
    pub async fn get_self_member(&self) -> ConcordResult<Option<Member>> {
        match self.resources.self_id() {
            Some(self_id) => self.get_member_or_null(self_id).await,
            None => Ok(None),
        }
    }

    pub fn members(&self) -> EntityStream<Member> {
        self.relate_all(self.supplier().get_guild_members(self.data.id), Member::from_record)
    }

    pub async fn get_role(&self, role_id: Snowflake) -> ConcordResult<Role> {
        require(self.get_role_or_null(role_id).await?, EntityType::Role, role_id)
    }

    pub async fn get_role_or_null(&self, role_id: Snowflake) -> ConcordResult<Option<Role>> {
        let found = self.supplier().get_role(self.data.id, role_id).await?;
        Ok(found.map(|role| self.relate(role, Role::bound)))
    }

    /// The role every member holds; it shares the guild's id.
    pub async fn get_everyone_role(&self) -> ConcordResult<Role> {
        self.get_role(self.data.id).await
    }

    pub fn roles(&self) -> EntityStream<Role> {
        self.relate_all(self.supplier().get_guild_roles(self.data.id), Role::bound)
    }

    pub async fn get_ban(&self, user_id: Snowflake) -> ConcordResult<Ban> {
        require(self.get_ban_or_null(user_id).await?, EntityType::Ban, user_id)
    }

    pub async fn get_ban_or_null(&self, user_id: Snowflake) -> ConcordResult<Option<Ban>> {
        let found = self.supplier().get_guild_ban(self.data.id, user_id).await?;
        Ok(found.map(|ban| self.relate(ban, Ban::bound)))
    }

    pub fn bans(&self) -> EntityStream<Ban> {
        self.relate_all(self.supplier().get_guild_bans(self.data.id), Ban::bound)
    }

    pub fn voice_regions(&self) -> EntityStream<Region> {
        self.relate_all(self.supplier().get_guild_voice_regions(self.data.id), Region::bound)
    }

    pub async fn get_scheduled_event(&self, event_id: Snowflake) -> ConcordResult<ScheduledEvent> {
        require(
            self.get_scheduled_event_or_null(event_id).await?,
            EntityType::ScheduledEvent,
            event_id,
        )
    }

    pub async fn get_scheduled_event_or_null(
        &self,
        event_id: Snowflake,
    ) -> ConcordResult<Option<ScheduledEvent>> {
        let found = self.supplier().get_scheduled_event(self.data.id, event_id).await?;
        Ok(found.map(|event| self.relate(event, ScheduledEvent::bound)))
    }

    pub async fn get_emoji_or_null(&self, emoji_id: Snowflake) -> ConcordResult<Option<GuildEmoji>> {
        let found = self.supplier().get_emoji(self.data.id, emoji_id).await?;
        Ok(found.map(|emoji| self.relate(emoji, GuildEmoji::bound)))
    }

    pub fn emojis(&self) -> EntityStream<GuildEmoji> {
        self.relate_all(self.supplier().get_emojis(self.data.id), GuildEmoji::bound)
    }

    pub fn webhooks(&self) -> EntityStream<Arc<WebhookData>> {
        self.supplier().get_guild_webhooks(self.data.id)
    }

    /// Members a prune of `days` inactivity would remove.
    ///
    /// Always asks the remote service; the count is never cached.
    pub async fn get_prune_count(&self, days: u32) -> ConcordResult<Option<u64>> {
        let count = self.resources.remote().get_guild_prune_count(self.data.id, days).await?;
        Ok(count.and_then(|c| c.pruned))
    }
}

view! {
    /// A guild as listed for the current user.
    PartialGuild => PartialGuildData
}

impl PartialGuild {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Whether the current user owns the guild; false when not reported.
    pub fn is_owner(&self) -> bool {
        self.data.owner.value().copied().unwrap_or(false)
    }

    /// The full guild. Fails with `EntityNotFound` when it cannot be resolved.
    pub async fn get_guild(&self) -> ConcordResult<Guild> {
        require(self.get_guild_or_null().await?, EntityType::Guild, self.data.id)
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let found = self.supplier().get_guild(self.data.id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }
}

view! {
    Role => RoleData
}

impl Role {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub fn guild_id(&self) -> Snowflake {
        self.data.guild_id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn is_everyone(&self) -> bool {
        self.data.id == self.data.guild_id
    }

    pub async fn get_guild(&self) -> ConcordResult<Guild> {
        require(self.get_guild_or_null().await?, EntityType::Guild, self.data.guild_id)
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let found = self.supplier().get_guild(self.data.guild_id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }
}

view! {
    Ban => BanData
}

impl Ban {
    pub fn user_id(&self) -> Snowflake {
        self.data.user_id
    }

    pub fn reason(&self) -> Option<&str> {
        self.data.reason.as_deref()
    }

    pub async fn get_user(&self) -> ConcordResult<User> {
        require(self.get_user_or_null().await?, EntityType::User, self.data.user_id)
    }

    pub async fn get_user_or_null(&self) -> ConcordResult<Option<User>> {
        let found = self.supplier().get_user(self.data.user_id).await?;
        Ok(found.map(|user| self.relate(user, User::bound)))
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let found = self.supplier().get_guild(self.data.guild_id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }
}

view! {
    /// A voice region. Has no relations.
    Region => RegionData
}

impl Region {
    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn is_optimal(&self) -> bool {
        self.data.optimal
    }
}

view! {
    GuildEmoji => EmojiData
}

impl GuildEmoji {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub async fn get_guild(&self) -> ConcordResult<Guild> {
        require(self.get_guild_or_null().await?, EntityType::Guild, self.data.guild_id)
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let found = self.supplier().get_guild(self.data.guild_id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }

    /// Roles allowed to use the emoji. Empty means everyone.
    pub fn roles(&self) -> EntityStream<Role> {
        let allowed = self.data.roles.clone();
        let roles = self.supplier().get_guild_roles(self.data.guild_id);
        let filtered: EntityStream<Arc<RoleData>> = Box::pin(roles.filter(move |role| {
            let keep = match role {
                Ok(role) => allowed.contains(&role.id),
                Err(_) => true,
            };
            futures::future::ready(keep)
        }));
        self.relate_all(filtered, Role::bound)
    }
}

view! {
    ScheduledEvent => ScheduledEventData
}

impl ScheduledEvent {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub async fn get_guild(&self) -> ConcordResult<Guild> {
        require(self.get_guild_or_null().await?, EntityType::Guild, self.data.guild_id)
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let found = self.supplier().get_guild(self.data.guild_id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }

    /// The creator, when the event reports one.
    pub async fn get_creator_or_null(&self) -> ConcordResult<Option<User>> {
        let Some(creator_id) = self.data.creator_id.value().copied() else {
            return Ok(None);
        };
        let found = self.supplier().get_user(creator_id).await?;
        Ok(found.map(|user| self.relate(user, User::bound)))
    }
}
