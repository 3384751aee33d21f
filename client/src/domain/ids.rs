//! Numeric identifiers assigned by the server.
//!
//! The API hands out positive integer ids for every record. Each resource
//! gets its own newtype so a task id can never be passed where a project id
//! is expected.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw server identifier.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw numeric value as sent on the wire.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id! {
    /// Identifier of a user account.
    UserId
}
define_id! {
    /// Identifier of a project.
    ProjectId
}
define_id! {
    /// Identifier of a task.
    TaskId
}
define_id! {
    /// Identifier of a stored attachment.
    FileId
}
