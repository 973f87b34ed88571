//! Opaque identifiers issued by the chat backend
//!
//! The backend hands out ids either as strings or as integers depending on the
//! resource; both are accepted on the wire and normalized to strings locally.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(String);

        impl $name {
            /// Create an id from any string-like value
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Get the inner string
            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Check if the id is blank (never issued by the backend)
            #[inline]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer
                    .deserialize_any(IdVisitor { label: $label })
                    .map(Self)
            }
        }
    };
}

string_id!(
    /// Chat room id
    RoomId,
    "room id"
);
string_id!(
    /// Chat message id
    MessageId,
    "message id"
);
string_id!(
    /// User id
    UserId,
    "user id"
);
string_id!(
    /// Artwork id referenced by share messages
    ArtworkId,
    "artwork id"
);

/// Accepts a string or an integer and yields its string form
struct IdVisitor {
    label: &'static str,
}

impl serde::de::Visitor<'_> for IdVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a string or integer {}", self.label)
    }

    fn visit_i64<E>(self, value: i64) -> Result<String, E>
    where
        E: serde::de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_u64<E>(self, value: u64) -> Result<String, E>
    where
        E: serde::de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_str<E>(self, value: &str) -> Result<String, E>
    where
        E: serde::de::Error,
    {
        if value.is_empty() {
            return Err(E::custom(format!("empty {}", self.label)));
        }
        Ok(value.to_string())
    }
}
