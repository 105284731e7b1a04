#![forbid(unsafe_code)]

//! Identity types for lanes (rooms) and intervals (reservations).
//!
//! Reservation feeds are not type-consistent: the same room may arrive as
//! `7`, `"7"` or `" 7 "` depending on which endpoint produced it. Every
//! constructor here funnels through [`canonical`], so equality, hashing and
//! cache keys see exactly one spelling per identity.
//!
//! # Invariants
//!
//! 1. `LaneId::from(7_u64) == LaneId::from("7") == LaneId::from(" 7 ")`.
//! 2. The canonical form never has leading or trailing whitespace.
//! 3. Serialization always emits a string; deserialization accepts a string
//!    or an integer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical string form shared by all identity types.
fn canonical(raw: &str) -> Arc<str> {
    Arc::from(raw.trim())
}

/// Raw identity as it may appear on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl RawId {
    fn into_canonical(self) -> Arc<str> {
        match self {
            Self::Text(s) => canonical(&s),
            Self::Signed(n) => canonical(&n.to_string()),
            Self::Unsigned(n) => canonical(&n.to_string()),
        }
    }
}

macro_rules! identity_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Build an id from any string spelling.
            #[must_use]
            pub fn new(raw: impl AsRef<str>) -> Self {
                Self(canonical(raw.as_ref()))
            }

            /// The canonical string form.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::new(raw)
            }
        }

        impl From<&String> for $name {
            fn from(raw: &String) -> Self {
                Self::new(raw)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self::new(raw.to_string())
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self::new(raw.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self::new(raw.to_string())
            }
        }

        impl From<usize> for $name {
            fn from(raw: usize) -> Self {
                Self::new(raw.to_string())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into_canonical()))
            }
        }
    };
}

identity_type!(
    /// Identity of a lane (a hotel room row).
    LaneId
);

identity_type!(
    /// Identity of an interval (a reservation detail record).
    IntervalId
);
