//! User-centred views: users, guild members and voice states.

use super::{require, view, Channel, Guild, Role, View};
use crate::strategy::Resources;
use crate::supplier::{EntityStream, MemberRecord};
use concord_core::{
    ConcordResult, EntitySupplyStrategy, EntityType, RoleData, Snowflake, UserData, VoiceStateData,
};
use futures::StreamExt;
use std::sync::Arc;

view! {
    User => UserData
}

impl User {
    pub fn id(&self) -> Snowflake {
        self.data.id
    }

    pub fn username(&self) -> &str {
        &self.data.username
    }

    pub fn is_bot(&self) -> bool {
        self.data.is_bot()
    }

    /// This user's membership in `guild_id`.
    pub async fn as_member(&self, guild_id: Snowflake) -> ConcordResult<Member> {
        require(self.as_member_or_null(guild_id).await?, EntityType::Member, self.data.id)
    }

    pub async fn as_member_or_null(&self, guild_id: Snowflake) -> ConcordResult<Option<Member>> {
        let found = self.supplier().get_member(guild_id, self.data.id).await?;
        Ok(found.map(|record| self.relate(record, Member::from_record)))
    }
}

view! {
    /// A guild member, always joined with its user.
    Member => MemberRecord
}

impl Member {
    pub fn from_record(
        record: MemberRecord,
        strategy: EntitySupplyStrategy,
        resources: Arc<Resources>,
    ) -> Self {
        Self::bound(Arc::new(record), strategy, resources)
    }

    pub fn guild_id(&self) -> Snowflake {
        self.data.guild_id()
    }

    pub fn user_id(&self) -> Snowflake {
        self.data.user_id()
    }

    /// The nickname if set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.data
            .member
            .nick
            .as_deref()
            .unwrap_or(&self.data.user.username)
    }

    pub fn role_ids(&self) -> &[Snowflake] {
        &self.data.member.roles
    }

    /// The user half of the membership, under the same strategy.
    pub fn as_user(&self) -> User {
        self.relate(Arc::clone(&self.data.user), User::bound)
    }

    pub async fn get_guild(&self) -> ConcordResult<Guild> {
        require(self.get_guild_or_null().await?, EntityType::Guild, self.guild_id())
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let found = self.supplier().get_guild(self.guild_id()).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }

    /// Roles held by this member; roles that no longer resolve are skipped.
    pub fn roles(&self) -> EntityStream<Role> {
        let held = self.data.member.roles.clone();
        let roles = self.supplier().get_guild_roles(self.guild_id());
        let filtered: EntityStream<Arc<RoleData>> = Box::pin(roles.filter(move |role| {
            let keep = match role {
                Ok(role) => held.contains(&role.id),
                Err(_) => true,
            };
            futures::future::ready(keep)
        }));
        self.relate_all(filtered, Role::bound)
    }
}

view! {
    VoiceState => VoiceStateData
}

impl VoiceState {
    pub fn user_id(&self) -> Snowflake {
        self.data.user_id
    }

    pub fn channel_id(&self) -> Option<Snowflake> {
        self.data.channel_id
    }

    pub async fn get_member(&self) -> ConcordResult<Member> {
        require(self.get_member_or_null().await?, EntityType::Member, self.data.user_id)
    }

    pub async fn get_member_or_null(&self) -> ConcordResult<Option<Member>> {
        let found = self
            .supplier()
            .get_member(self.data.guild_id, self.data.user_id)
            .await?;
        Ok(found.map(|record| self.relate(record, Member::from_record)))
    }

    pub async fn get_user_or_null(&self) -> ConcordResult<Option<User>> {
        let found = self.supplier().get_user(self.data.user_id).await?;
        Ok(found.map(|user| self.relate(user, User::bound)))
    }

    pub async fn get_guild_or_null(&self) -> ConcordResult<Option<Guild>> {
        let found = self.supplier().get_guild(self.data.guild_id).await?;
        Ok(found.map(|guild| self.relate(guild, Guild::bound)))
    }

    /// The connected channel; `None` once the user left voice.
    pub async fn get_channel_or_null(&self) -> ConcordResult<Option<Channel>> {
        let Some(channel_id) = self.data.channel_id else {
            return Ok(None);
        };
        let found = self.supplier().get_channel(channel_id).await?;
        Ok(found.map(|channel| self.relate(channel, Channel::bound)))
    }
}
