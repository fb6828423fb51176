//! Three-state optional wire fields.
//!
//! The remote API distinguishes a key that was omitted from a key that was
//! sent with `null`. `Option<T>` cannot express that, so fields where the
//! difference matters use [`Optional<T>`]:
//!
//! ```ignore
//! #[derive(Deserialize, Serialize)]
//! struct Patch {
//!     #[serde(default, skip_serializing_if = "Optional::is_missing")]
//!     description: Optional<String>,
//! }
//! ```
//!
//! `#[serde(default)]` is what turns an absent key into `Missing`; a present
//! `null` deserializes to `Null`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A wire field that may be absent, explicitly null, or carry a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Optional<T> {
    /// The key was not present.
    Missing,
    /// The key was present with a `null` value.
    Null,
    /// The key was present with a value.
    Value(T),
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Optional::Missing
    }
}

impl<T> Optional<T> {
    /// Returns true if the key was omitted.
    pub fn is_missing(&self) -> bool {
        matches!(self, Optional::Missing)
    }

    /// Returns true if the key was sent as `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Optional::Null)
    }

    /// Returns true if a value is present.
    pub fn is_value(&self) -> bool {
        matches!(self, Optional::Value(_))
    }

    /// Collapse to a plain nullable, treating `Missing` and `Null` alike.
    pub fn value(&self) -> Option<&T> {
        match self {
            Optional::Value(value) => Some(value),
            Optional::Missing | Optional::Null => None,
        }
    }

    /// Consuming form of [`Optional::value`].
    pub fn into_option(self) -> Option<T> {
        match self {
            Optional::Value(value) => Some(value),
            Optional::Missing | Optional::Null => None,
        }
    }

    pub fn as_ref(&self) -> Optional<&T> {
        match self {
            Optional::Missing => Optional::Missing,
            Optional::Null => Optional::Null,
            Optional::Value(value) => Optional::Value(value),
        }
    }

    /// Map the contained value, preserving `Missing` and `Null`.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Optional<U> {
        match self {
            Optional::Missing => Optional::Missing,
            Optional::Null => Optional::Null,
            Optional::Value(value) => Optional::Value(f(value)),
        }
    }

    /// Keep the current state unless it is `Missing`, in which case take `other`.
    ///
    /// This is the patch-merge rule: an omitted key leaves the old state alone,
    /// an explicit `null` clears it.
    pub fn or(self, other: Optional<T>) -> Optional<T> {
        match self {
            Optional::Missing => other,
            present => present,
        }
    }
}

impl<T> From<Option<T>> for Optional<T> {
    /// A plain nullable has no notion of "absent", so `None` becomes `Null`.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Optional::Value(value),
            None => Optional::Null,
        }
    }
}

impl<T: Serialize> Serialize for Optional<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Missing should be skipped by the container; if it is not, it
            // degrades to null.
            Optional::Missing | Optional::Null => serializer.serialize_none(),
            Optional::Value(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Optional<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Optional::from)
    }
}
