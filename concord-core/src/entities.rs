//! Canonical Record structures.
//!
//! Records are the flat, normalized form in which entities are cached. They
//! are immutable once built: an update produces a whole new Record.

use crate::{
    ChannelType, Optional, ScheduledEntityType, ScheduledEventStatus, ScheduledPrivacyLevel,
    Snowflake, Timestamp,
};
use serde::{Deserialize, Serialize};

/// User - an account on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub bot: Optional<bool>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub public_flags: Optional<u64>,
}

impl UserData {
    /// Returns true only if the user is known to be a bot.
    pub fn is_bot(&self) -> bool {
        self.bot.value().copied().unwrap_or(false)
    }
}

/// Membership of a user in a guild, keyed by (guild id, user id).
///
/// Holds no user profile fields; those live in the matching [`UserData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberData {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    pub joined_at: Timestamp,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub premium_since: Optional<Timestamp>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub pending: Optional<bool>,
}

/// Guild - a community server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildData {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub owner_id: Snowflake,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub description: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub vanity_url_code: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub banner: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub splash: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub member_count: Optional<u64>,
}

/// The subset of a guild visible before (or without) joining it.
///
/// Returned by the current-user guild listing and by invites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialGuildData {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub owner: Optional<bool>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub permissions: Optional<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub vanity_url_code: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub description: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub banner: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub splash: Optional<String>,
}

/// Role within a guild, keyed by (guild id, role id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleData {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i32,
    pub permissions: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

/// Channel - guild text/voice channel, thread, or direct message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelData {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub guild_id: Optional<Snowflake>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub name: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub position: Optional<i32>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub topic: Optional<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub nsfw: Optional<bool>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub parent_id: Optional<Snowflake>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub last_message_id: Optional<Snowflake>,
}

/// Message posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub guild_id: Optional<Snowflake>,
    pub author: UserData,
    pub content: String,
    pub timestamp: Timestamp,
    pub edited_timestamp: Option<Timestamp>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub reactions: Vec<ReactionData>,
}

impl MessageData {
    /// The reaction entry for `emoji`, if anyone reacted with it.
    pub fn reaction(&self, emoji: &ReactionEmoji) -> Option<&ReactionData> {
        self.reactions.iter().find(|r| r.emoji.same_emoji(emoji))
    }
}

/// One emoji's reactions on a message.
///
/// `user_ids` is not part of the remote payload; it is filled by the event
/// ingestion pipeline as reaction events arrive and may therefore be shorter
/// than `count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionData {
    pub emoji: ReactionEmoji,
    pub count: u32,
    #[serde(default)]
    pub me: bool,
    #[serde(default)]
    pub user_ids: Vec<Snowflake>,
}

/// Emoji used in a reaction: either a guild custom emoji or a unicode one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EmojiPayload", into = "EmojiPayload")]
pub enum ReactionEmoji {
    Custom {
        id: Snowflake,
        name: String,
        animated: bool,
    },
    Unicode {
        name: String,
    },
}

impl ReactionEmoji {
    /// The form used in reaction routes: `name:id` for custom emoji, the
    /// character itself otherwise.
    pub fn formatted(&self) -> String {
        match self {
            ReactionEmoji::Custom { id, name, .. } => format!("{}:{}", name, id),
            ReactionEmoji::Unicode { name } => name.clone(),
        }
    }

    /// Custom emoji compare by id alone; names can change.
    pub fn same_emoji(&self, other: &ReactionEmoji) -> bool {
        match (self, other) {
            (ReactionEmoji::Custom { id: a, .. }, ReactionEmoji::Custom { id: b, .. }) => a == b,
            (ReactionEmoji::Unicode { name: a }, ReactionEmoji::Unicode { name: b }) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmojiPayload {
    id: Option<Snowflake>,
    name: Option<String>,
    #[serde(default)]
    animated: bool,
}

impl From<EmojiPayload> for ReactionEmoji {
    fn from(payload: EmojiPayload) -> Self {
        match payload.id {
            Some(id) => ReactionEmoji::Custom {
                id,
                name: payload.name.unwrap_or_default(),
                animated: payload.animated,
            },
            None => ReactionEmoji::Unicode {
                name: payload.name.unwrap_or_default(),
            },
        }
    }
}

impl From<ReactionEmoji> for EmojiPayload {
    fn from(emoji: ReactionEmoji) -> Self {
        match emoji {
            ReactionEmoji::Custom { id, name, animated } => EmojiPayload {
                id: Some(id),
                name: Some(name),
                animated,
            },
            ReactionEmoji::Unicode { name } => EmojiPayload {
                id: None,
                name: Some(name),
                animated: false,
            },
        }
    }
}

/// Ban of a user from a guild, keyed by (guild id, user id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanData {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub reason: Option<String>,
}

/// Voice region, keyed by its string id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub optimal: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub custom: bool,
}

/// A user's voice connection state in a guild, keyed by (guild id, user id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStateData {
    pub guild_id: Snowflake,
    pub channel_id: Option<Snowflake>,
    pub user_id: Snowflake,
    pub session_id: String,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub self_stream: bool,
    #[serde(default)]
    pub suppress: bool,
}

/// Guild custom emoji, keyed by (guild id, emoji id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiData {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub user: Optional<UserData>,
    #[serde(default)]
    pub require_colons: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub animated: bool,
}

/// Scheduled guild event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEventData {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub channel_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub creator_id: Optional<Snowflake>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub description: Optional<String>,
    pub scheduled_start_time: Timestamp,
    pub scheduled_end_time: Option<Timestamp>,
    pub privacy_level: ScheduledPrivacyLevel,
    pub status: ScheduledEventStatus,
    pub entity_type: ScheduledEntityType,
    pub entity_id: Option<Snowflake>,
    pub entity_metadata: Option<ScheduledEventMetadata>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub creator: Optional<UserData>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub user_count: Optional<u64>,
}

/// Extra location data for events that are not in a guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduledEventMetadata {
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub speaker_ids: Optional<Vec<Snowflake>>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub location: Optional<String>,
}

/// Webhook attached to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookData {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub guild_id: Optional<Snowflake>,
    pub channel_id: Snowflake,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub user: Optional<UserData>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub token: Optional<String>,
}

/// Estimated number of members a prune would remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneCount {
    pub pruned: Option<u64>,
}
