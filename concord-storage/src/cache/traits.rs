//! Cached record descriptor and cache statistics.
//!
//! Every Record type that can live in a store implements [`Record`], which
//! names its entity type and how to extract its key.

use concord_core::{
    BanData, ChannelData, EmojiData, EntityType, GuildData, MemberData, MessageData, RegionData,
    RoleData, ScheduledEventData, Snowflake, UserData, VoiceStateData,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Descriptor trait for types that can be cached.
///
/// # Implementation Requirements
///
/// - `ENTITY_TYPE` must be unique per implementing type; the registry keys
///   stores by it
/// - `key()` must be stable for the lifetime of the Record
/// - Implementations must be `Send + Sync + 'static` so Records can be shared
///   as `Arc<R>` across tasks
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identity key, a single id or a composite of ids.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// The descriptor selecting this type's store and eviction policy.
    const ENTITY_TYPE: EntityType;

    /// Extract this Record's identity key.
    fn key(&self) -> Self::Key;
}

/// Statistics about one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of `get` calls that found a Record.
    pub hits: u64,
    /// Number of `get` calls that found nothing.
    pub misses: u64,
    /// Number of entries currently in the store.
    pub entry_count: u64,
    /// Number of entries evicted due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// IMPLEMENTATIONS FOR CONCORD RECORDS
// ============================================================================

impl Record for UserData {
    type Key = Snowflake;
    const ENTITY_TYPE: EntityType = EntityType::User;

    fn key(&self) -> Snowflake {
        self.id
    }
}

impl Record for MemberData {
    /// (guild id, user id)
    type Key = (Snowflake, Snowflake);
    const ENTITY_TYPE: EntityType = EntityType::Member;

    fn key(&self) -> Self::Key {
        (self.guild_id, self.user_id)
    }
}

impl Record for GuildData {
    type Key = Snowflake;
    const ENTITY_TYPE: EntityType = EntityType::Guild;

    fn key(&self) -> Snowflake {
        self.id
    }
}

impl Record for RoleData {
    /// (guild id, role id)
    type Key = (Snowflake, Snowflake);
    const ENTITY_TYPE: EntityType = EntityType::Role;

    fn key(&self) -> Self::Key {
        (self.guild_id, self.id)
    }
}

impl Record for ChannelData {
    type Key = Snowflake;
    const ENTITY_TYPE: EntityType = EntityType::Channel;

    fn key(&self) -> Snowflake {
        self.id
    }
}

impl Record for MessageData {
    /// (channel id, message id)
    type Key = (Snowflake, Snowflake);
    const ENTITY_TYPE: EntityType = EntityType::Message;

    fn key(&self) -> Self::Key {
        (self.channel_id, self.id)
    }
}

impl Record for BanData {
    /// (guild id, user id)
    type Key = (Snowflake, Snowflake);
    const ENTITY_TYPE: EntityType = EntityType::Ban;

    fn key(&self) -> Self::Key {
        (self.guild_id, self.user_id)
    }
}

impl Record for RegionData {
    type Key = String;
    const ENTITY_TYPE: EntityType = EntityType::Region;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Record for VoiceStateData {
    /// (guild id, user id)
    type Key = (Snowflake, Snowflake);
    const ENTITY_TYPE: EntityType = EntityType::VoiceState;

    fn key(&self) -> Self::Key {
        (self.guild_id, self.user_id)
    }
}

impl Record for EmojiData {
    /// (guild id, emoji id)
    type Key = (Snowflake, Snowflake);
    const ENTITY_TYPE: EntityType = EntityType::Emoji;

    fn key(&self) -> Self::Key {
        (self.guild_id, self.id)
    }
}

impl Record for ScheduledEventData {
    type Key = Snowflake;
    const ENTITY_TYPE: EntityType = EntityType::ScheduledEvent;

    fn key(&self) -> Snowflake {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty_is_zero() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_ratio() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_descriptors_are_distinct() {
        let mut types = vec![
            UserData::ENTITY_TYPE,
            MemberData::ENTITY_TYPE,
            GuildData::ENTITY_TYPE,
            RoleData::ENTITY_TYPE,
            ChannelData::ENTITY_TYPE,
            MessageData::ENTITY_TYPE,
            BanData::ENTITY_TYPE,
            RegionData::ENTITY_TYPE,
            VoiceStateData::ENTITY_TYPE,
            EmojiData::ENTITY_TYPE,
            ScheduledEventData::ENTITY_TYPE,
        ];
        types.sort();
        types.dedup();
        assert_eq!(types.len(), EntityType::ALL.len());
    }
}
