//! Shared type definitions for the affiliate directory.
//!
//! This crate is the single source of truth for the records, write
//! payloads, and enumerations used across the workspace. Types flow
//! downstream to `TypeScript` via `ts-rs` for the admin and public front
//! ends.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for every stored record
//! - [`enums`] -- Sections, offer status, audit actions, pick-list categories
//! - [`structs`] -- Stored records (networks, offers, banners, rotations, clicks)
//! - [`drafts`] -- Write payloads with field-level validation rules
//! - [`lists`] -- Lenient parsing of list-valued fields

pub mod drafts;
pub mod enums;
pub mod ids;
pub mod lists;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use drafts::{
    AffiliateDetailsDraft, BannerDraft, BulkOfferEdit, DEFAULT_ROTATION_DURATION_MS,
    MasterDataDraft, NetworkDraft, NetworkRequestDraft, NewAuditEntry, NewBannerClick,
    OfferDraft, OfferPatch, RotationDraft,
};
pub use enums::{
    AuditAction, MasterDataCategory, NetworkRequestStatus, OfferStatus, ParseEnumError, Section,
};
pub use ids::{
    AuditLogId, BannerId, ClickId, MasterDataId, NetworkId, NetworkRequestId, OfferId,
    RotationId,
};
pub use structs::{
    AffiliateDetails, AuditLogEntry, Banner, BannerClick, BannerClickCount, BannerRotation,
    CustomClick, MasterDataEntry, Network, NetworkRequest, Offer,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::NetworkId::export_all();
        let _ = crate::ids::OfferId::export_all();
        let _ = crate::ids::BannerId::export_all();
        let _ = crate::ids::RotationId::export_all();
        let _ = crate::ids::MasterDataId::export_all();
        let _ = crate::ids::AuditLogId::export_all();
        let _ = crate::ids::ClickId::export_all();
        let _ = crate::ids::NetworkRequestId::export_all();

        // Enums
        let _ = crate::enums::Section::export_all();
        let _ = crate::enums::OfferStatus::export_all();
        let _ = crate::enums::AuditAction::export_all();
        let _ = crate::enums::NetworkRequestStatus::export_all();
        let _ = crate::enums::MasterDataCategory::export_all();

        // Records
        let _ = crate::structs::Network::export_all();
        let _ = crate::structs::Offer::export_all();
        let _ = crate::structs::Banner::export_all();
        let _ = crate::structs::BannerRotation::export_all();
        let _ = crate::structs::MasterDataEntry::export_all();
        let _ = crate::structs::AuditLogEntry::export_all();
        let _ = crate::structs::BannerClick::export_all();
        let _ = crate::structs::BannerClickCount::export_all();
        let _ = crate::structs::CustomClick::export_all();
        let _ = crate::structs::NetworkRequest::export_all();
        let _ = crate::structs::AffiliateDetails::export_all();

        // Drafts
        let _ = crate::drafts::NetworkDraft::export_all();
        let _ = crate::drafts::OfferDraft::export_all();
        let _ = crate::drafts::BannerDraft::export_all();
        let _ = crate::drafts::RotationDraft::export_all();
        let _ = crate::drafts::MasterDataDraft::export_all();
        let _ = crate::drafts::NetworkRequestDraft::export_all();
        let _ = crate::drafts::AffiliateDetailsDraft::export_all();
        let _ = crate::drafts::OfferPatch::export_all();
        let _ = crate::drafts::BulkOfferEdit::export_all();
    }
}
