//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every stored record has a strongly-typed ID so a banner id can never be
//! passed where a rotation id is expected. The database generates UUID v7
//! values on insert; the `new()` constructors exist for the in-memory
//! directory, tests, and seed data.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an affiliate network.
    NetworkId
}

define_id! {
    /// Unique identifier for an offer listed under a network.
    OfferId
}

define_id! {
    /// Unique identifier for a promotional banner.
    BannerId
}

define_id! {
    /// Unique identifier for a banner rotation group.
    RotationId
}

define_id! {
    /// Unique identifier for a master data pick-list value.
    MasterDataId
}

define_id! {
    /// Unique identifier for an audit log entry.
    AuditLogId
}

define_id! {
    /// Unique identifier for a recorded banner click.
    ClickId
}

define_id! {
    /// Unique identifier for a network join request.
    NetworkRequestId
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn ids_are_distinct() {
        let first = BannerId::new();
        let second = BannerId::new();
        assert_ne!(first, second);
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let id = RotationId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
        let back: RotationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = OfferId::new();
        let parsed: OfferId = format!("  {id} ").parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<OfferId>().is_err());
    }
}
