//! Identifier newtypes for stored records.
//!
//! Every record kind gets its own id type so a `MemeId` can never be passed
//! where a `FragmentId` is expected. All ids wrap a UUID and implement `Ord`
//! so stores can return records in a stable order.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from its hyphenated UUID form.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`Fragment`](super::Fragment).
    FragmentId
);
record_id!(
    /// Identifier of a [`Meme`](super::Meme).
    MemeId
);
record_id!(
    /// Identifier of a [`Law`](super::Law).
    LawId
);
record_id!(
    /// Identifier of a persisted [`Excuse`](super::Excuse).
    ExcuseId
);
