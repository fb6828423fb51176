//! Enum types for Concord entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// DESCRIPTORS
// ============================================================================

/// Entity type discriminator.
///
/// Every cached Record type maps to exactly one variant; the variant selects
/// the store and the eviction policy for that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Member,
    Guild,
    Role,
    Channel,
    Message,
    Ban,
    Region,
    VoiceState,
    Emoji,
    ScheduledEvent,
}

impl EntityType {
    /// All descriptors, in declaration order.
    pub const ALL: [EntityType; 11] = [
        EntityType::User,
        EntityType::Member,
        EntityType::Guild,
        EntityType::Role,
        EntityType::Channel,
        EntityType::Message,
        EntityType::Ban,
        EntityType::Region,
        EntityType::VoiceState,
        EntityType::Emoji,
        EntityType::ScheduledEvent,
    ];

    /// Stable snake_case name, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Member => "member",
            EntityType::Guild => "guild",
            EntityType::Role => "role",
            EntityType::Channel => "channel",
            EntityType::Message => "message",
            EntityType::Ban => "ban",
            EntityType::Region => "region",
            EntityType::VoiceState => "voice_state",
            EntityType::Emoji => "emoji",
            EntityType::ScheduledEvent => "scheduled_event",
        }
    }
}

/// Which supplier(s) an operation consults, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntitySupplyStrategy {
    /// Only the in-memory cache. Never performs I/O.
    CacheOnly,
    /// Only the remote service. Never reads or fills the cache.
    RemoteOnly,
    /// Cache first; on a miss, the remote service, writing results back.
    #[default]
    CacheWithRemoteFallback,
    /// Remote service first, writing results back; on any failure, the cache.
    RemoteWithCacheFallback,
}

impl EntitySupplyStrategy {
    /// Returns true if this strategy may perform remote calls.
    pub fn touches_remote(&self) -> bool {
        !matches!(self, EntitySupplyStrategy::CacheOnly)
    }

    /// Returns true if this strategy writes remote results into the cache.
    pub fn writes_back(&self) -> bool {
        matches!(
            self,
            EntitySupplyStrategy::CacheWithRemoteFallback
                | EntitySupplyStrategy::RemoteWithCacheFallback
        )
    }
}

// ============================================================================
// FORWARD-COMPATIBLE WIRE ENUMS
// ============================================================================

/// Defines an integer-coded wire enum with an `Unknown(code)` catch-all.
///
/// Known codes are matched first; any other code decodes to `Unknown`, never
/// to an error, so new server-side values do not break decoding.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "i32", into = "i32")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A code this version does not know about.
            Unknown(i32),
        }

        impl $name {
            /// Every known variant.
            pub const KNOWN: &'static [$name] = &[$($name::$variant),+];

            /// The raw wire code.
            pub fn code(&self) -> i32 {
                match self {
                    $($name::$variant => $code,)+
                    $name::Unknown(code) => *code,
                }
            }

            /// Returns true for the `Unknown` catch-all.
            pub fn is_unknown(&self) -> bool {
                matches!(self, $name::Unknown(_))
            }
        }

        impl From<i32> for $name {
            fn from(code: i32) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.code()
            }
        }
    };
}

coded_enum! {
    /// Who can see a scheduled event.
    ScheduledPrivacyLevel {
        Public = 1,
        GuildOnly = 2,
    }
}

coded_enum! {
    /// Lifecycle state of a scheduled event.
    ScheduledEventStatus {
        Scheduled = 1,
        Active = 2,
        Completed = 3,
        Canceled = 4,
    }
}

coded_enum! {
    /// Where a scheduled event takes place.
    ScheduledEntityType {
        None = 0,
        StageInstance = 1,
        Voice = 2,
        External = 3,
    }
}

coded_enum! {
    /// Kind of channel.
    ChannelType {
        GuildText = 0,
        Dm = 1,
        GuildVoice = 2,
        GroupDm = 3,
        GuildCategory = 4,
        GuildNews = 5,
        PublicThread = 11,
        PrivateThread = 12,
        GuildStageVoice = 13,
    }
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "user" => Ok(EntityType::User),
            "member" => Ok(EntityType::Member),
            "guild" => Ok(EntityType::Guild),
            "role" => Ok(EntityType::Role),
            "channel" => Ok(EntityType::Channel),
            "message" => Ok(EntityType::Message),
            "ban" => Ok(EntityType::Ban),
            "region" => Ok(EntityType::Region),
            "voicestate" => Ok(EntityType::VoiceState),
            "emoji" => Ok(EntityType::Emoji),
            "scheduledevent" => Ok(EntityType::ScheduledEvent),
            _ => Err(format!("Invalid EntityType: {}", s)),
        }
    }
}

impl fmt::Display for EntitySupplyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntitySupplyStrategy::CacheOnly => "CacheOnly",
            EntitySupplyStrategy::RemoteOnly => "RemoteOnly",
            EntitySupplyStrategy::CacheWithRemoteFallback => "CacheWithRemoteFallback",
            EntitySupplyStrategy::RemoteWithCacheFallback => "RemoteWithCacheFallback",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for EntitySupplyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "cacheonly" | "cache" => Ok(EntitySupplyStrategy::CacheOnly),
            "remoteonly" | "remote" | "rest" => Ok(EntitySupplyStrategy::RemoteOnly),
            "cachewithremotefallback" => Ok(EntitySupplyStrategy::CacheWithRemoteFallback),
            "remotewithcachefallback" => Ok(EntitySupplyStrategy::RemoteWithCacheFallback),
            _ => Err(format!("Invalid EntitySupplyStrategy: {}", s)),
        }
    }
}
