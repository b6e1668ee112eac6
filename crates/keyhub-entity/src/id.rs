//! Newtype wrappers around `i64` for all record identifiers.
//!
//! Using distinct types prevents accidentally passing a `UserId` where a
//! `RoleId` is expected. Identifiers are sequence-assigned by the record
//! store; the zero value means "not yet persisted".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `i64`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// The unassigned sentinel used before the store allocates a key.
            pub const UNSET: Self = Self(0);

            /// Return the raw key value.
            pub fn value(self) -> i64 {
                self.0
            }

            /// Whether the store has assigned this identifier yet.
            pub fn is_set(self) -> bool {
                self.0 != 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::UNSET
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a [`crate::User`].
    UserId
}

define_id! {
    /// Identifier of a [`crate::Group`].
    GroupId
}

define_id! {
    /// Identifier of a [`crate::Role`].
    RoleId
}

define_id! {
    /// Identifier of a [`crate::Permission`].
    PermissionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_sentinel() {
        assert!(!UserId::UNSET.is_set());
        assert!(UserId::from(3).is_set());
    }

    #[test]
    fn test_transparent_serde() {
        let id = RoleId::from(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: RoleId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_parse() {
        assert_eq!("17".parse::<PermissionId>().unwrap(), PermissionId(17));
        assert!("x".parse::<PermissionId>().is_err());
    }
}
