//! Identifier types for users, chatrooms and messages.
//!
//! Chatroom and message ids are `UUIDv7`, so sorting them reproduces
//! generation order. User ids are random (`UUIDv4`) to avoid leaking the
//! login time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a time-ordered UUID (v7).
#[inline]
#[must_use]
fn uuid_time_ordered() -> Uuid {
    Uuid::now_v7()
}

/// Generate a random UUID (v4).
#[inline]
#[must_use]
fn uuid_random() -> Uuid {
    Uuid::new_v4()
}

/// Declare a UUID newtype with a consistent API.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident,
        generator = $gen:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            /// Create a new identifier.
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self($gen())
            }

            /// Wrap an existing UUID.
            #[inline]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Borrow the underlying UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_uuid_id!(
    /// Identifier of an authenticated user.
    UserId,
    generator = uuid_random
);

define_uuid_id!(
    /// Identifier of a chatroom.
    ChatroomId,
    generator = uuid_time_ordered
);

define_uuid_id!(
    /// Identifier of a message, unique within the whole store.
    MessageId,
    generator = uuid_time_ordered
);
