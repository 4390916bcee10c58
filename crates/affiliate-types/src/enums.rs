//! Enumeration types for the affiliate directory.
//!
//! Each enum has a single canonical text spelling used on the wire, in the
//! database, and in the generated `TypeScript` bindings. Parsing from text
//! is lenient about case and about `_` versus `-`, because legacy rows were
//! written by hand-rolled forms with inconsistent spellings.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A text value did not match any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    /// Name of the enum that was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Fold case, whitespace, and separators so `Fixed_Top` matches `fixed-top`.
fn fold(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Generates an enum with a canonical text spelling per variant.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $text:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical wire and database spelling.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = fold(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| fold(v.as_str()) == wanted)
                    .ok_or_else(|| ParseEnumError {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    })
            }
        }
    };
}

text_enum! {
    /// One of the five fixed layout slots a banner or rotation renders in.
    ///
    /// Declaration order is the layout order used when a page placement is
    /// assembled, so `Ord` and [`Section::ALL`] both iterate top to bottom.
    Section {
        /// Pinned bar at the very top of the viewport.
        #[serde(alias = "fixed_top")]
        FixedTop => "fixed-top",
        /// Banner strip above the main content.
        Top => "top",
        /// Column beside the main content.
        Sidebar => "sidebar",
        /// Strip below the main content.
        Footer => "footer",
        /// Pinned bar at the very bottom of the viewport.
        #[serde(alias = "fixed_bottom")]
        FixedBottom => "fixed-bottom",
    }
}

text_enum! {
    /// Publication state of an offer.
    OfferStatus {
        /// Listed on the public site.
        Active => "active",
        /// Hidden from the public site but kept for later.
        Paused => "paused",
        /// Past its promotion window.
        Expired => "expired",
    }
}

impl Default for OfferStatus {
    fn default() -> Self {
        Self::Active
    }
}

text_enum! {
    /// Kind of change recorded in the audit log.
    AuditAction {
        /// A record was created through an admin form.
        Create => "create",
        /// A record was replaced through an admin form.
        Update => "update",
        /// A record was deleted.
        Delete => "delete",
        /// A record was changed by a bulk edit.
        BulkUpdate => "bulk_update",
        /// A record was created by a spreadsheet import.
        Import => "import",
    }
}

text_enum! {
    /// Review state of a network join request.
    NetworkRequestStatus {
        /// Submitted and awaiting review.
        Pending => "pending",
        /// Accepted by an admin.
        Approved => "approved",
        /// Declined by an admin.
        Rejected => "rejected",
    }
}

text_enum! {
    /// Pick-list a master data value belongs to.
    MasterDataCategory {
        /// Offer and network categories.
        Category => "category",
        /// Free-form tags.
        Tag => "tag",
        /// Country or region codes.
        Geo => "geo",
        /// Device classes (desktop, mobile, ...).
        Device => "device",
        /// Marketing verticals.
        Vertical => "vertical",
        /// Payout models (CPA, CPL, ...).
        PayoutType => "payout_type",
        /// Network payment methods.
        PaymentMethod => "payment_method",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn sections_iterate_in_layout_order() {
        let names: Vec<&str> = Section::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["fixed-top", "top", "sidebar", "footer", "fixed-bottom"]
        );
        assert!(Section::FixedTop < Section::FixedBottom);
    }

    #[test]
    fn section_parse_is_lenient() {
        assert_eq!("Fixed_Top".parse::<Section>().unwrap(), Section::FixedTop);
        assert_eq!(" sidebar ".parse::<Section>().unwrap(), Section::Sidebar);
        let err = "header".parse::<Section>().unwrap_err();
        assert_eq!(err.kind, "Section");
    }

    #[test]
    fn section_serde_accepts_legacy_underscore() {
        let s: Section = serde_json::from_str("\"fixed_bottom\"").unwrap();
        assert_eq!(s, Section::FixedBottom);
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"fixed-bottom\"");
    }

    #[test]
    fn audit_action_keeps_snake_case_spelling() {
        assert_eq!(AuditAction::BulkUpdate.as_str(), "bulk_update");
        assert_eq!(
            "bulk-update".parse::<AuditAction>().unwrap(),
            AuditAction::BulkUpdate
        );
    }
}
