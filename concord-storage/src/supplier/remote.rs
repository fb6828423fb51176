//! Retrieval served by the remote service.
//!
//! The transport itself is out of scope: it is reached through the
//! [`RemoteService`] trait, which takes a [`Route`] plus [`RouteParams`] and
//! returns the decoded-JSON body or a categorized [`RequestError`]. This
//! module turns those bodies into Records and never touches the cache.

use super::{EntityStream, EntitySupplier, MemberRecord};
use crate::pagination::paginate_forwards;
use async_stream::stream;
use async_trait::async_trait;
use concord_core::{
    BanData, BanPayload, ChannelData, ConcordError, ConcordResult, GuildData, GuildMemberPayload,
    MessageData, PartialGuildData, PruneCount, ReactionEmoji, RegionData, RemoteConfig,
    RequestError, RoleData, RolePayload, ScheduledEventData, Snowflake, UserData,
};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// ROUTES
// ============================================================================

/// Remote endpoints consumed by [`RemoteSupplier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    GuildGet,
    ChannelGet,
    UserGet,
    CurrentUserGet,
    CurrentUserGuildsGet,
    GuildMemberGet,
    GuildMembersGet,
    MessageGet,
    GuildRolesGet,
    GuildBanGet,
    GuildBansGet,
    ReactionsGet,
    VoiceRegionsGet,
    GuildVoiceRegionsGet,
    GuildPruneCountGet,
    GuildScheduledEventGet,
}

impl Route {
    pub fn method(&self) -> &'static str {
        "GET"
    }

    /// Path template with `{placeholder}` segments.
    pub fn template(&self) -> &'static str {
        match self {
            Route::GuildGet => "/guilds/{guild.id}",
            Route::ChannelGet => "/channels/{channel.id}",
            Route::UserGet => "/users/{user.id}",
            Route::CurrentUserGet => "/users/@me",
            Route::CurrentUserGuildsGet => "/users/@me/guilds",
            Route::GuildMemberGet => "/guilds/{guild.id}/members/{user.id}",
            Route::GuildMembersGet => "/guilds/{guild.id}/members",
            Route::MessageGet => "/channels/{channel.id}/messages/{message.id}",
            Route::GuildRolesGet => "/guilds/{guild.id}/roles",
            Route::GuildBanGet => "/guilds/{guild.id}/bans/{user.id}",
            Route::GuildBansGet => "/guilds/{guild.id}/bans",
            Route::ReactionsGet => "/channels/{channel.id}/messages/{message.id}/reactions/{emoji}",
            Route::VoiceRegionsGet => "/voice/regions",
            Route::GuildVoiceRegionsGet => "/guilds/{guild.id}/regions",
            Route::GuildPruneCountGet => "/guilds/{guild.id}/prune",
            Route::GuildScheduledEventGet => "/guilds/{guild.id}/scheduled-events/{event.id}",
        }
    }

    /// The concrete path for `params`. Unset placeholders are left in place.
    pub fn path(&self, params: &RouteParams) -> String {
        let mut path = self.template().to_string();
        let ids = [
            ("{guild.id}", params.guild_id),
            ("{channel.id}", params.channel_id),
            ("{message.id}", params.message_id),
            ("{user.id}", params.user_id),
            ("{event.id}", params.event_id),
        ];
        for (placeholder, value) in ids {
            if let Some(value) = value {
                path = path.replace(placeholder, &value.to_string());
            }
        }
        if let Some(emoji) = &params.emoji {
            path = path.replace("{emoji}", emoji);
        }
        path
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.template())
    }
}

/// Path and query parameters for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RouteParams {
    pub guild_id: Option<Snowflake>,
    pub channel_id: Option<Snowflake>,
    pub message_id: Option<Snowflake>,
    pub user_id: Option<Snowflake>,
    pub event_id: Option<Snowflake>,
    pub emoji: Option<String>,
    pub after: Option<Snowflake>,
    pub limit: Option<usize>,
    pub days: Option<u32>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild(mut self, id: Snowflake) -> Self {
        self.guild_id = Some(id);
        self
    }

    pub fn channel(mut self, id: Snowflake) -> Self {
        self.channel_id = Some(id);
        self
    }

    pub fn message(mut self, id: Snowflake) -> Self {
        self.message_id = Some(id);
        self
    }

    pub fn user(mut self, id: Snowflake) -> Self {
        self.user_id = Some(id);
        self
    }

    pub fn event(mut self, id: Snowflake) -> Self {
        self.event_id = Some(id);
        self
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn after(mut self, cursor: Option<Snowflake>) -> Self {
        self.after = cursor;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    /// Query-string pairs, in a stable order.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(after) = self.after {
            query.push(("after", after.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(days) = self.days {
            query.push(("days", days.to_string()));
        }
        query
    }
}

/// The transport-facing contract.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn call(&self, route: Route, params: RouteParams) -> Result<serde_json::Value, RequestError>;
}

// ============================================================================
// SUPPLIER
// ============================================================================

/// [`EntitySupplier`] over a [`RemoteService`].
#[derive(Clone)]
pub struct RemoteSupplier {
    service: Arc<dyn RemoteService>,
    config: RemoteConfig,
}

impl fmt::Debug for RemoteSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSupplier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(route: Route, value: serde_json::Value) -> Result<T, RequestError> {
    serde_json::from_value(value).map_err(|e| RequestError::Decode {
        route: route.to_string(),
        reason: e.to_string(),
    })
}

/// Map exactly the not-found kind to `None`; everything else propagates.
fn catch_not_found<T>(result: Result<T, RequestError>) -> ConcordResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A non-paginated listing as a lazy stream. A not-found listing is empty.
fn listing<T, Fut>(fetch: Fut) -> EntityStream<T>
where
    T: Send + 'static,
    Fut: Future<Output = Result<Vec<T>, RequestError>> + Send + 'static,
{
    Box::pin(stream! {
        match catch_not_found(fetch.await) {
            Ok(items) => {
                for item in items.unwrap_or_default() {
                    yield Ok(item);
                }
            }
            Err(e) => {
                yield Err(e);
            }
        }
    })
}

fn join_member(
    guild_id: Snowflake,
    payload: GuildMemberPayload,
    user: Option<UserData>,
) -> Option<MemberRecord> {
    let user = payload.user.value().cloned().or(user)?;
    let (member, _) = payload.into_records(guild_id, user.id);
    Some(MemberRecord {
        member: Arc::new(member),
        user: Arc::new(user),
    })
}

impl RemoteSupplier {
    /// Validates the batch sizes in `config`.
    pub fn new(service: Arc<dyn RemoteService>, config: RemoteConfig) -> ConcordResult<Self> {
        config.validate()?;
        Ok(Self { service, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    async fn request<T: DeserializeOwned>(&self, route: Route, params: RouteParams) -> Result<T, RequestError> {
        let body = self.service.call(route, params).await?;
        decode(route, body)
    }

    /// Estimated number of members a prune of `days` inactivity would remove.
    pub async fn get_guild_prune_count(&self, guild_id: Snowflake, days: u32) -> ConcordResult<Option<PruneCount>> {
        let params = RouteParams::new().guild(guild_id).days(days);
        catch_not_found(self.request(Route::GuildPruneCountGet, params).await)
    }

    /// Guilds the current user belongs to, in their partial form.
    pub fn get_current_user_guilds(&self) -> EntityStream<PartialGuildData> {
        let supplier = self.clone();
        paginate_forwards(
            self.config.guilds_batch_size,
            |guild: &PartialGuildData| guild.id,
            move |after, limit| {
                let supplier = supplier.clone();
                async move {
                    let params = RouteParams::new().after(after).limit(limit);
                    supplier
                        .request::<Vec<PartialGuildData>>(Route::CurrentUserGuildsGet, params)
                        .await
                        .map_err(ConcordError::from)
                }
            },
        )
    }

    async fn member_page(
        &self,
        guild_id: Snowflake,
        after: Option<Snowflake>,
        limit: usize,
    ) -> ConcordResult<Vec<MemberRecord>> {
        let params = RouteParams::new().guild(guild_id).after(after).limit(limit);
        let page: Option<Vec<GuildMemberPayload>> =
            catch_not_found(self.request(Route::GuildMembersGet, params).await)?;
        page.unwrap_or_default()
            .into_iter()
            .map(|payload| {
                join_member(guild_id, payload, None).ok_or_else(|| {
                    ConcordError::from(RequestError::Decode {
                        route: Route::GuildMembersGet.to_string(),
                        reason: "member entry carries no user".to_string(),
                    })
                })
            })
            .collect()
    }

    async fn ban_page(
        &self,
        guild_id: Snowflake,
        after: Option<Snowflake>,
        limit: usize,
    ) -> ConcordResult<Vec<Arc<BanData>>> {
        let params = RouteParams::new().guild(guild_id).after(after).limit(limit);
        let page: Option<Vec<BanPayload>> =
            catch_not_found(self.request(Route::GuildBansGet, params).await)?;
        Ok(page
            .unwrap_or_default()
            .into_iter()
            .map(|payload| Arc::new(payload.into_records(guild_id).0))
            .collect())
    }

    async fn reactor_page(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
        after: Option<Snowflake>,
        limit: usize,
    ) -> ConcordResult<Vec<Arc<UserData>>> {
        let params = RouteParams::new()
            .channel(channel_id)
            .message(message_id)
            .emoji(emoji)
            .after(after)
            .limit(limit);
        let page: Option<Vec<UserData>> =
            catch_not_found(self.request(Route::ReactionsGet, params).await)?;
        Ok(page.unwrap_or_default().into_iter().map(Arc::new).collect())
    }

    async fn roles(&self, guild_id: Snowflake) -> Result<Vec<Arc<RoleData>>, RequestError> {
        let payloads: Vec<RolePayload> = self
            .request(Route::GuildRolesGet, RouteParams::new().guild(guild_id))
            .await?;
        Ok(payloads
            .into_iter()
            .map(|payload| Arc::new(payload.into_record(guild_id)))
            .collect())
    }

    async fn regions(&self, route: Route, params: RouteParams) -> Result<Vec<Arc<RegionData>>, RequestError> {
        let regions: Vec<RegionData> = self.request(route, params).await?;
        Ok(regions.into_iter().map(Arc::new).collect())
    }
}

#[async_trait]
impl EntitySupplier for RemoteSupplier {
    async fn get_guild(&self, guild_id: Snowflake) -> ConcordResult<Option<Arc<GuildData>>> {
        let result = self.request(Route::GuildGet, RouteParams::new().guild(guild_id)).await;
        Ok(catch_not_found(result)?.map(Arc::new))
    }

    fn get_guilds(&self) -> EntityStream<Arc<GuildData>> {
        let partials = self.get_current_user_guilds();
        let supplier = self.clone();
        Box::pin(stream! {
            let mut partials = partials;
            while let Some(partial) = partials.next().await {
                let partial = match partial {
                    Ok(partial) => partial,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                match supplier.get_guild(partial.id).await {
                    Ok(Some(guild)) => {
                        yield Ok(guild);
                    }
                    Ok(None) => {
                        tracing::debug!(guild_id = %partial.id, "Listed guild not found, skipping");
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        })
    }

    async fn get_channel(&self, channel_id: Snowflake) -> ConcordResult<Option<Arc<ChannelData>>> {
        let result = self.request(Route::ChannelGet, RouteParams::new().channel(channel_id)).await;
        Ok(catch_not_found(result)?.map(Arc::new))
    }

    async fn get_user(&self, user_id: Snowflake) -> ConcordResult<Option<Arc<UserData>>> {
        let result = self.request(Route::UserGet, RouteParams::new().user(user_id)).await;
        Ok(catch_not_found(result)?.map(Arc::new))
    }

    async fn get_self(&self) -> ConcordResult<Option<Arc<UserData>>> {
        let result = self.request(Route::CurrentUserGet, RouteParams::new()).await;
        Ok(catch_not_found(result)?.map(Arc::new))
    }

    async fn get_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ConcordResult<Option<MemberRecord>> {
        let params = RouteParams::new().guild(guild_id).user(user_id);
        let Some(payload) =
            catch_not_found(self.request::<GuildMemberPayload>(Route::GuildMemberGet, params).await)?
        else {
            return Ok(None);
        };
        let user = if payload.user.is_value() {
            None
        } else {
            let result = self
                .request::<UserData>(Route::UserGet, RouteParams::new().user(user_id))
                .await;
            match catch_not_found(result)? {
                Some(user) => Some(user),
                None => return Ok(None),
            }
        };
        Ok(join_member(guild_id, payload, user))
    }

    fn get_guild_members(&self, guild_id: Snowflake) -> EntityStream<MemberRecord> {
        let supplier = self.clone();
        paginate_forwards(
            self.config.members_batch_size,
            |member: &MemberRecord| member.user_id(),
            move |after, limit| {
                let supplier = supplier.clone();
                async move { supplier.member_page(guild_id, after, limit).await }
            },
        )
    }

    async fn get_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> ConcordResult<Option<Arc<MessageData>>> {
        let params = RouteParams::new().channel(channel_id).message(message_id);
        let result = self.request(Route::MessageGet, params).await;
        Ok(catch_not_found(result)?.map(Arc::new))
    }

    async fn get_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
    ) -> ConcordResult<Option<Arc<RoleData>>> {
        let roles = catch_not_found(self.roles(guild_id).await)?;
        Ok(roles
            .unwrap_or_default()
            .into_iter()
            .find(|role| role.id == role_id))
    }

    fn get_guild_roles(&self, guild_id: Snowflake) -> EntityStream<Arc<RoleData>> {
        let supplier = self.clone();
        listing(async move { supplier.roles(guild_id).await })
    }

    async fn get_guild_ban(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ConcordResult<Option<Arc<BanData>>> {
        let params = RouteParams::new().guild(guild_id).user(user_id);
        let result = self.request::<BanPayload>(Route::GuildBanGet, params).await;
        Ok(catch_not_found(result)?.map(|payload| Arc::new(payload.into_records(guild_id).0)))
    }

    fn get_guild_bans(&self, guild_id: Snowflake) -> EntityStream<Arc<BanData>> {
        let supplier = self.clone();
        paginate_forwards(
            self.config.bans_batch_size,
            |ban: &Arc<BanData>| ban.user_id,
            move |after, limit| {
                let supplier = supplier.clone();
                async move { supplier.ban_page(guild_id, after, limit).await }
            },
        )
    }

    fn get_regions(&self) -> EntityStream<Arc<RegionData>> {
        let supplier = self.clone();
        listing(async move { supplier.regions(Route::VoiceRegionsGet, RouteParams::new()).await })
    }

    fn get_guild_voice_regions(&self, guild_id: Snowflake) -> EntityStream<Arc<RegionData>> {
        let supplier = self.clone();
        listing(async move {
            supplier
                .regions(Route::GuildVoiceRegionsGet, RouteParams::new().guild(guild_id))
                .await
        })
    }

    fn get_reactors(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: ReactionEmoji,
    ) -> EntityStream<Arc<UserData>> {
        let supplier = self.clone();
        let emoji = emoji.formatted();
        paginate_forwards(
            self.config.reactors_batch_size,
            |user: &Arc<UserData>| user.id,
            move |after, limit| {
                let supplier = supplier.clone();
                let emoji = emoji.clone();
                async move {
                    supplier
                        .reactor_page(channel_id, message_id, emoji, after, limit)
                        .await
                }
            },
        )
    }

    async fn get_scheduled_event(
        &self,
        guild_id: Snowflake,
        event_id: Snowflake,
    ) -> ConcordResult<Option<Arc<ScheduledEventData>>> {
        let params = RouteParams::new().guild(guild_id).event(event_id);
        let result = self.request(Route::GuildScheduledEventGet, params).await;
        Ok(catch_not_found(result)?.map(Arc::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path_renders_params() {
        let params = RouteParams::new()
            .channel(Snowflake::new(4))
            .message(Snowflake::new(40))
            .emoji("party:41");
        assert_eq!(
            Route::ReactionsGet.path(&params),
            "/channels/4/messages/40/reactions/party:41"
        );
        assert_eq!(Route::GuildGet.to_string(), "GET /guilds/{guild.id}");
    }

    #[test]
    fn test_route_query_order() {
        let params = RouteParams::new().limit(100).after(Some(Snowflake::new(9)));
        assert_eq!(
            params.query(),
            vec![("after", "9".to_string()), ("limit", "100".to_string())]
        );
    }

    #[test]
    fn test_catch_not_found_only_absorbs_not_found() {
        let absorbed: ConcordResult<Option<u8>> = catch_not_found(Err(RequestError::NotFound {
            route: "GET /users/1".to_string(),
        }));
        assert_eq!(absorbed, Ok(None));

        let propagated: ConcordResult<Option<u8>> = catch_not_found(Err(RequestError::RateLimited {
            route: "GET /users/1".to_string(),
            retry_after_ms: 10,
        }));
        assert!(matches!(
            propagated,
            Err(ConcordError::Request(RequestError::RateLimited { .. }))
        ));
    }

    #[test]
    fn test_decode_failure_is_classified() {
        let err = decode::<UserData>(Route::UserGet, serde_json::json!({"id": "1"})).unwrap_err();
        assert!(matches!(err, RequestError::Decode { .. }));
        assert_eq!(err.route(), "GET /users/{user.id}");
    }
}
