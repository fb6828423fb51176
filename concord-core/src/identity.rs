//! Identity types for Concord entities

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Milliseconds between the Unix epoch and the platform epoch (2015-01-01T00:00:00Z).
pub const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

/// Number of low bits below the timestamp (worker, process, increment).
const TIMESTAMP_SHIFT: u32 = 22;

/// Largest millisecond offset the timestamp bits can hold.
const MAX_TIMESTAMP_MS: u64 = u64::MAX >> TIMESTAMP_SHIFT;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Opaque 64-bit, time-ordered identifier.
///
/// The upper 42 bits hold milliseconds since [`PLATFORM_EPOCH_MS`], so ids
/// created later compare greater. Ids are unique per entity type only; a user
/// and a guild may share a value.
///
/// On the wire ids are decimal strings. Deserialization also accepts plain
/// integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(u64);

impl Snowflake {
    /// The smallest possible id.
    pub const MIN: Snowflake = Snowflake(0);

    /// The largest possible id.
    pub const MAX: Snowflake = Snowflake(u64::MAX);

    /// Wrap a raw id value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw id value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The smallest id that could have been created at `timestamp`.
    ///
    /// Instants before the platform epoch clamp to [`Snowflake::MIN`]; instants
    /// past the 42-bit timestamp range clamp to [`Snowflake::MAX`].
    pub fn from_timestamp(timestamp: Timestamp) -> Self {
        let millis = timestamp.timestamp_millis();
        let since_epoch = (millis as i128 - PLATFORM_EPOCH_MS as i128).max(0) as u64;
        if since_epoch > MAX_TIMESTAMP_MS {
            return Self::MAX;
        }
        Self(since_epoch << TIMESTAMP_SHIFT)
    }

    /// The creation instant encoded in this id.
    pub fn timestamp(self) -> Timestamp {
        let millis = (self.0 >> TIMESTAMP_SHIFT) + PLATFORM_EPOCH_MS;
        DateTime::<Utc>::from_timestamp_millis(millis as i64).unwrap_or_default()
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Snowflake> for u64 {
    fn from(value: Snowflake) -> Self {
        value.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

struct SnowflakeVisitor;

impl<'de> Visitor<'de> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a snowflake as a decimal string or unsigned integer")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Snowflake(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        u64::try_from(value)
            .map(Snowflake)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}
