//! Concord Test Utilities
//!
//! Shared test infrastructure for the Concord workspace:
//! - Proptest generators for identities, Records and configuration
//! - Fixtures for Records and their wire payloads
//! - A scripted [`MockRemoteService`] that records every call
//! - Assertions for Concord error kinds

pub use concord_core::{
    BanData, BanPayload, CacheConfig, ChannelData, ChannelType, ClientConfig, ConcordError,
    ConcordResult, EmojiData, EntitySupplyStrategy, EntityType, EvictionPolicy, GuildData,
    GuildMemberPayload, MemberData, MessageData, Optional, PartialGuildData, PruneCount, ReactionData,
    ReactionEmoji, RegionData, RemoteConfig, RequestError, RoleData, RolePayload,
    ScheduledEntityType, ScheduledEventData, ScheduledEventStatus, ScheduledPrivacyLevel,
    Snowflake, Timestamp, UserData, VoiceStateData,
};
pub use concord_storage::{Resources, Route, RouteParams};

use async_trait::async_trait;
use chrono::TimeZone;
use concord_storage::RemoteService;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Serialize a fixture into the JSON body the remote service would return.
pub fn wire<T: Serialize>(value: &T) -> Value {
    serde_json::json!(value)
}

// ============================================================================
// MOCK REMOTE SERVICE
// ============================================================================

#[derive(Debug, Clone)]
enum Reply {
    Body(Value),
    Failure(RequestError),
    /// Ascending `(id, body)` pairs served page by page from `after`/`limit`.
    Collection(Vec<(Snowflake, Value)>),
}

#[derive(Debug, Default)]
struct MockState {
    replies: HashMap<(Route, RouteParams), Reply>,
    outage: Option<RequestError>,
    calls: Vec<(Route, RouteParams)>,
}

/// Scripted [`RemoteService`].
///
/// Replies are matched on the exact `(route, params)` first, then on the
/// route with paging parameters cleared, which is where collections are
/// registered. Anything unscripted answers not-found. Every call is recorded,
/// including failed ones.
#[derive(Debug, Default)]
pub struct MockRemoteService {
    state: Mutex<MockState>,
}

impl MockRemoteService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `(route, params)` with `body`.
    pub fn respond(&self, route: Route, params: RouteParams, body: Value) -> &Self {
        self.state().replies.insert((route, params), Reply::Body(body));
        self
    }

    /// Answer `(route, params)` with `error`.
    pub fn fail(&self, route: Route, params: RouteParams, error: RequestError) -> &Self {
        self.state().replies.insert((route, params), Reply::Failure(error));
        self
    }

    /// Serve `items` as a paginated collection for `(route, params)`.
    ///
    /// `params` must not carry `after` or `limit`; those come from each call.
    pub fn serve_collection<T, F>(&self, route: Route, params: RouteParams, items: &[T], id_of: F) -> &Self
    where
        T: Serialize,
        F: Fn(&T) -> Snowflake,
    {
        let mut entries: Vec<(Snowflake, Value)> =
            items.iter().map(|item| (id_of(item), wire(item))).collect();
        entries.sort_by_key(|(id, _)| *id);
        self.state()
            .replies
            .insert((route, params), Reply::Collection(entries));
        self
    }

    /// Fail every call with `error` until [`restore`](Self::restore).
    pub fn outage(&self, error: RequestError) -> &Self {
        self.state().outage = Some(error);
        self
    }

    pub fn restore(&self) -> &Self {
        self.state().outage = None;
        self
    }

    pub fn calls(&self) -> Vec<(Route, RouteParams)> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, route: Route) -> usize {
        self.state().calls.iter().filter(|(r, _)| *r == route).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn answer(state: &MockState, route: Route, params: &RouteParams) -> Result<Value, RequestError> {
        let described = format!("{} {}", route.method(), route.path(params));
        if let Some(error) = &state.outage {
            return Err(error.clone());
        }
        if let Some(reply) = state.replies.get(&(route, params.clone())) {
            return match reply {
                Reply::Body(body) => Ok(body.clone()),
                Reply::Failure(error) => Err(error.clone()),
                Reply::Collection(entries) => Ok(page(entries, None, None)),
            };
        }

        let mut base = params.clone();
        base.after = None;
        base.limit = None;
        match state.replies.get(&(route, base)) {
            Some(Reply::Collection(entries)) => Ok(page(entries, params.after, params.limit)),
            _ => Err(RequestError::NotFound { route: described }),
        }
    }
}

fn page(entries: &[(Snowflake, Value)], after: Option<Snowflake>, limit: Option<usize>) -> Value {
    let items: Vec<Value> = entries
        .iter()
        .filter(|(id, _)| after.map_or(true, |cursor| *id > cursor))
        .take(limit.unwrap_or(usize::MAX))
        .map(|(_, body)| body.clone())
        .collect();
    Value::Array(items)
}

#[async_trait]
impl RemoteService for MockRemoteService {
    async fn call(&self, route: Route, params: RouteParams) -> Result<Value, RequestError> {
        let mut state = self.state();
        state.calls.push((route, params.clone()));
        Self::answer(&state, route, &params)
    }
}

/// A transport failure for `route`, as a dropped connection would produce.
pub fn transport_failure(route: Route) -> RequestError {
    RequestError::Transport {
        route: route.to_string(),
        reason: "connection reset by peer".to_string(),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Concord identities, Records and configuration.

    use super::*;
    use proptest::prelude::*;

    /// Generate a Snowflake in the range real ids occupy.
    pub fn arb_snowflake() -> impl Strategy<Value = Snowflake> {
        (1u64..(1u64 << 62)).prop_map(Snowflake::new)
    }

    /// Generate `size` distinct Snowflakes, ascending.
    pub fn arb_distinct_snowflakes(
        size: impl Into<prop::collection::SizeRange>,
    ) -> impl Strategy<Value = Vec<Snowflake>> {
        prop::collection::btree_set(1u64..1_000_000, size)
            .prop_map(|ids| ids.into_iter().map(Snowflake::new).collect())
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
        })
    }

    /// Generate a tri-state optional.
    pub fn arb_optional<T: Strategy>(inner: T) -> impl Strategy<Value = Optional<T::Value>>
    where
        T::Value: Clone,
    {
        prop_oneof![
            Just(Optional::Missing),
            Just(Optional::Null),
            inner.prop_map(Optional::Value),
        ]
    }

    pub fn arb_user() -> impl Strategy<Value = UserData> {
        (
            arb_snowflake(),
            "[a-z][a-z0-9_]{1,15}",
            0u16..10000,
            prop::option::of("[0-9a-f]{32}"),
            arb_optional(any::<bool>()),
        )
            .prop_map(|(id, username, discriminator, avatar, bot)| UserData {
                id,
                username,
                discriminator: format!("{:04}", discriminator),
                avatar,
                bot,
                public_flags: Optional::Missing,
            })
    }

    pub fn arb_role(guild_id: Snowflake) -> impl Strategy<Value = RoleData> {
        (arb_snowflake(), "[A-Za-z ]{1,20}", any::<u32>(), -5i32..250).prop_map(
            move |(id, name, color, position)| RoleData {
                id,
                guild_id,
                name,
                color: color & 0x00FF_FFFF,
                hoist: false,
                position,
                permissions: "0".to_string(),
                managed: false,
                mentionable: false,
            },
        )
    }

    pub fn arb_entity_type() -> impl Strategy<Value = EntityType> {
        prop::sample::select(EntityType::ALL.to_vec())
    }

    /// Generate a valid eviction policy.
    pub fn arb_eviction_policy() -> impl Strategy<Value = EvictionPolicy> {
        prop_oneof![
            Just(EvictionPolicy::Unbounded),
            (1usize..512).prop_map(|capacity| EvictionPolicy::Lru { capacity }),
        ]
    }

    pub fn arb_strategy() -> impl Strategy<Value = EntitySupplyStrategy> {
        prop_oneof![
            Just(EntitySupplyStrategy::CacheOnly),
            Just(EntitySupplyStrategy::RemoteOnly),
            Just(EntitySupplyStrategy::CacheWithRemoteFallback),
            Just(EntitySupplyStrategy::RemoteWithCacheFallback),
        ]
    }

    /// Generate a configuration that passes validation.
    pub fn arb_valid_config() -> impl Strategy<Value = ClientConfig> {
        (
            arb_eviction_policy(),
            prop::collection::hash_map(arb_entity_type(), arb_eviction_policy(), 0..4),
            (1usize..2000, 1usize..2000, 1usize..200, 1usize..2000),
            arb_strategy(),
        )
            .prop_map(|(default_policy, policies, (guilds, members, reactors, bans), strategy)| {
                let mut cache = CacheConfig::new().with_default_policy(default_policy);
                for (entity_type, policy) in policies {
                    cache = cache.with_policy(entity_type, policy);
                }
                let remote = RemoteConfig::default()
                    .with_guilds_batch_size(guilds)
                    .with_members_batch_size(members)
                    .with_reactors_batch_size(reactors)
                    .with_bans_batch_size(bans);
                ClientConfig::default()
                    .with_cache(cache)
                    .with_remote(remote)
                    .with_default_strategy(strategy)
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built Records, wire payloads and client resources.

    use super::*;

    /// A fixed timestamp, so fixtures compare equal across calls.
    pub fn timestamp() -> Timestamp {
        chrono::Utc
            .with_ymd_and_hms(2021, 6, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    pub fn user(id: u64) -> UserData {
        UserData {
            id: Snowflake::new(id),
            username: format!("user{}", id),
            discriminator: "0001".to_string(),
            avatar: None,
            bot: Optional::Missing,
            public_flags: Optional::Missing,
        }
    }

    pub fn bot_user(id: u64) -> UserData {
        UserData {
            bot: Optional::Value(true),
            ..user(id)
        }
    }

    pub fn guild(id: u64, owner_id: u64) -> GuildData {
        GuildData {
            id: Snowflake::new(id),
            name: format!("guild{}", id),
            icon: None,
            owner_id: Snowflake::new(owner_id),
            features: vec![],
            description: Optional::Missing,
            vanity_url_code: Optional::Missing,
            banner: Optional::Missing,
            splash: Optional::Missing,
            member_count: Optional::Missing,
        }
    }

    pub fn partial_guild(id: u64) -> PartialGuildData {
        PartialGuildData {
            id: Snowflake::new(id),
            name: format!("guild{}", id),
            icon: None,
            owner: Optional::Value(false),
            permissions: Optional::Missing,
            features: vec![],
            vanity_url_code: Optional::Missing,
            description: Optional::Missing,
            banner: Optional::Missing,
            splash: Optional::Missing,
        }
    }

    pub fn member(guild_id: u64, user_id: u64) -> MemberData {
        MemberData {
            guild_id: Snowflake::new(guild_id),
            user_id: Snowflake::new(user_id),
            nick: None,
            roles: vec![],
            joined_at: timestamp(),
            premium_since: Optional::Missing,
            deaf: false,
            mute: false,
            pending: Optional::Missing,
        }
    }

    /// The member route's body for `member`, embedding `user` when given.
    pub fn member_payload(member: &MemberData, user: Option<&UserData>) -> GuildMemberPayload {
        GuildMemberPayload {
            user: user.cloned().map_or(Optional::Missing, Optional::Value),
            nick: member.nick.clone(),
            roles: member.roles.clone(),
            joined_at: member.joined_at,
            premium_since: member.premium_since.clone(),
            deaf: member.deaf,
            mute: member.mute,
            pending: member.pending.clone(),
        }
    }

    pub fn role(guild_id: u64, id: u64) -> RoleData {
        RoleData {
            id: Snowflake::new(id),
            guild_id: Snowflake::new(guild_id),
            name: format!("role{}", id),
            color: 0,
            hoist: false,
            position: 1,
            permissions: "0".to_string(),
            managed: false,
            mentionable: false,
        }
    }

    pub fn role_payload(role: &RoleData) -> RolePayload {
        RolePayload {
            id: role.id,
            name: role.name.clone(),
            color: role.color,
            hoist: role.hoist,
            position: role.position,
            permissions: role.permissions.clone(),
            managed: role.managed,
            mentionable: role.mentionable,
        }
    }

    pub fn ban(guild_id: u64, user_id: u64) -> BanData {
        BanData {
            guild_id: Snowflake::new(guild_id),
            user_id: Snowflake::new(user_id),
            reason: Some("spam".to_string()),
        }
    }

    pub fn ban_payload(user: &UserData) -> BanPayload {
        BanPayload {
            reason: Some("spam".to_string()),
            user: user.clone(),
        }
    }

    pub fn text_channel(id: u64, guild_id: u64) -> ChannelData {
        ChannelData {
            id: Snowflake::new(id),
            kind: ChannelType::GuildText,
            guild_id: Optional::Value(Snowflake::new(guild_id)),
            name: Optional::Value(format!("channel{}", id)),
            position: Optional::Value(0),
            topic: Optional::Null,
            nsfw: Optional::Value(false),
            parent_id: Optional::Null,
            last_message_id: Optional::Missing,
        }
    }

    pub fn dm_channel(id: u64) -> ChannelData {
        ChannelData {
            id: Snowflake::new(id),
            kind: ChannelType::Dm,
            guild_id: Optional::Missing,
            name: Optional::Missing,
            position: Optional::Missing,
            topic: Optional::Missing,
            nsfw: Optional::Missing,
            parent_id: Optional::Missing,
            last_message_id: Optional::Missing,
        }
    }

    pub fn message(channel_id: u64, id: u64, author: UserData) -> MessageData {
        MessageData {
            id: Snowflake::new(id),
            channel_id: Snowflake::new(channel_id),
            guild_id: Optional::Missing,
            author,
            content: format!("message {}", id),
            timestamp: timestamp(),
            edited_timestamp: None,
            pinned: false,
            reactions: vec![],
        }
    }

    pub fn region(id: &str) -> RegionData {
        RegionData {
            id: id.to_string(),
            name: id.to_uppercase(),
            optimal: false,
            deprecated: false,
            custom: false,
        }
    }

    pub fn voice_state(guild_id: u64, user_id: u64, channel_id: Option<u64>) -> VoiceStateData {
        VoiceStateData {
            guild_id: Snowflake::new(guild_id),
            channel_id: channel_id.map(Snowflake::new),
            user_id: Snowflake::new(user_id),
            session_id: format!("session-{}", user_id),
            deaf: false,
            mute: false,
            self_deaf: false,
            self_mute: false,
            self_stream: false,
            suppress: false,
        }
    }

    pub fn emoji(guild_id: u64, id: u64) -> EmojiData {
        EmojiData {
            id: Snowflake::new(id),
            guild_id: Snowflake::new(guild_id),
            name: Some(format!("emoji{}", id)),
            roles: vec![],
            user: Optional::Missing,
            require_colons: true,
            managed: false,
            animated: false,
        }
    }

    pub fn scheduled_event(guild_id: u64, id: u64) -> ScheduledEventData {
        ScheduledEventData {
            id: Snowflake::new(id),
            guild_id: Snowflake::new(guild_id),
            channel_id: None,
            creator_id: Optional::Missing,
            name: format!("event{}", id),
            description: Optional::Missing,
            scheduled_start_time: timestamp(),
            scheduled_end_time: None,
            privacy_level: ScheduledPrivacyLevel::GuildOnly,
            status: ScheduledEventStatus::Scheduled,
            entity_type: ScheduledEntityType::External,
            entity_id: None,
            entity_metadata: None,
            creator: Optional::Missing,
            user_count: Optional::Missing,
        }
    }

    /// Client resources over `service` with the default configuration.
    pub fn resources(service: Arc<MockRemoteService>) -> Arc<Resources> {
        resources_with(&ClientConfig::default(), service)
    }

    /// Client resources over `service`. Panics if `config` is invalid.
    #[track_caller]
    pub fn resources_with(config: &ClientConfig, service: Arc<MockRemoteService>) -> Arc<Resources> {
        match Resources::from_config(config, service) {
            Ok(resources) => Arc::new(resources),
            Err(e) => panic!("invalid test configuration: {}", e),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Concord error kinds.

    use super::*;

    #[track_caller]
    pub fn assert_entity_not_found<T: std::fmt::Debug>(
        result: &ConcordResult<T>,
        entity_type: EntityType,
        id: Snowflake,
    ) {
        match result {
            Err(ConcordError::EntityNotFound {
                entity_type: et,
                id: found,
            }) => {
                assert_eq!(*et, entity_type, "Wrong entity type in EntityNotFound");
                assert_eq!(*found, id, "Wrong id in EntityNotFound");
            }
            other => panic!("Expected EntityNotFound for {:?}, got: {:?}", entity_type, other),
        }
    }

    #[track_caller]
    pub fn assert_unsupported<T: std::fmt::Debug>(result: &ConcordResult<T>, operation: &str) {
        match result {
            Err(ConcordError::Unsupported { operation: op }) => {
                assert_eq!(*op, operation, "Wrong operation in Unsupported");
            }
            other => panic!("Expected Unsupported({}), got: {:?}", operation, other),
        }
    }

    #[track_caller]
    pub fn assert_transport_failure<T: std::fmt::Debug>(result: &ConcordResult<T>) {
        match result {
            Err(ConcordError::Request(RequestError::Transport { .. })) => {}
            other => panic!("Expected Transport failure, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &ConcordResult<T>) {
        match result {
            Err(ConcordError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }
}
