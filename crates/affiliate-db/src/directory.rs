//! The store the API talks to.
//!
//! [`Directory`] is an enum over the two backends rather than a trait
//! object: every operation is a `match` that forwards to the per-table
//! `PostgreSQL` store or to the [`MemoryDirectory`].

use std::sync::Arc;

use affiliate_core::analytics::ClickFilter;
use affiliate_types::{
    AffiliateDetails, AffiliateDetailsDraft, AuditLogEntry, Banner, BannerClick, BannerClickCount,
    BannerDraft, BannerId, BannerRotation, MasterDataCategory, MasterDataDraft, MasterDataEntry,
    MasterDataId, Network, NetworkDraft, NetworkId, NetworkRequest, NetworkRequestDraft,
    NetworkRequestId, NetworkRequestStatus, NewAuditEntry, NewBannerClick, Offer, OfferDraft,
    OfferId, RotationDraft, RotationId,
};
use chrono::{DateTime, Utc};

use crate::audit_store::AuditStore;
use crate::banner_store::BannerStore;
use crate::click_store::ClickStore;
use crate::error::DbError;
use crate::master_data_store::MasterDataStore;
use crate::memory::MemoryDirectory;
use crate::network_store::NetworkStore;
use crate::offer_store::{OfferStore, draft_of};
use crate::postgres::PostgresPool;
use crate::request_store::RequestStore;

/// A handle to the directory's persistent state.
#[derive(Debug, Clone)]
pub enum Directory {
    /// Backed by `PostgreSQL`.
    Postgres(PostgresPool),
    /// Backed by process memory.
    Memory(Arc<MemoryDirectory>),
}

impl Directory {
    /// A fresh, empty in-memory directory.
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryDirectory::new()))
    }

    /// Short backend name for logs and the health endpoint.
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Check that the backend is reachable.
    pub async fn ping(&self) -> Result<(), DbError> {
        match self {
            Self::Postgres(pg) => pg.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Release backend resources.
    pub async fn close(&self) {
        if let Self::Postgres(pg) = self {
            pg.close().await;
        }
    }

    // -----------------------------------------------------------------------
    // Networks
    // -----------------------------------------------------------------------

    /// List every network, oldest first.
    pub async fn list_networks(&self) -> Result<Vec<Network>, DbError> {
        match self {
            Self::Postgres(pg) => NetworkStore::new(pg.pool()).list().await,
            Self::Memory(mem) => Ok(mem.list_networks().await),
        }
    }

    /// Load one network.
    pub async fn get_network(&self, id: NetworkId) -> Result<Option<Network>, DbError> {
        match self {
            Self::Postgres(pg) => NetworkStore::new(pg.pool()).get(id).await,
            Self::Memory(mem) => Ok(mem.get_network(id).await),
        }
    }

    /// Insert a network.
    pub async fn insert_network(&self, draft: &NetworkDraft) -> Result<Network, DbError> {
        match self {
            Self::Postgres(pg) => NetworkStore::new(pg.pool()).insert(draft).await,
            Self::Memory(mem) => Ok(mem.insert_network(draft).await),
        }
    }

    /// Replace a network.
    pub async fn update_network(&self, id: NetworkId, draft: &NetworkDraft) -> Result<Option<Network>, DbError> {
        match self {
            Self::Postgres(pg) => NetworkStore::new(pg.pool()).update(id, draft).await,
            Self::Memory(mem) => Ok(mem.update_network(id, draft).await),
        }
    }

    /// Delete a network. Its offers lose their owner.
    pub async fn delete_network(&self, id: NetworkId) -> Result<Option<Network>, DbError> {
        match self {
            Self::Postgres(pg) => NetworkStore::new(pg.pool()).delete(id).await,
            Self::Memory(mem) => Ok(mem.delete_network(id).await),
        }
    }

    /// Load the private account details for a network.
    pub async fn affiliate_details(&self, id: NetworkId) -> Result<Option<AffiliateDetails>, DbError> {
        match self {
            Self::Postgres(pg) => NetworkStore::new(pg.pool()).affiliate_details(id).await,
            Self::Memory(mem) => Ok(mem.affiliate_details(id).await),
        }
    }

    /// Insert or replace the private account details for a network.
    pub async fn upsert_affiliate_details(
        &self,
        id: NetworkId,
        draft: &AffiliateDetailsDraft,
    ) -> Result<AffiliateDetails, DbError> {
        match self {
            Self::Postgres(pg) => {
                NetworkStore::new(pg.pool())
                    .upsert_affiliate_details(id, draft)
                    .await
            }
            Self::Memory(mem) => mem.upsert_affiliate_details(id, draft).await,
        }
    }

    // -----------------------------------------------------------------------
    // Offers
    // -----------------------------------------------------------------------

    /// List every offer, oldest first.
    pub async fn list_offers(&self) -> Result<Vec<Offer>, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).list().await,
            Self::Memory(mem) => Ok(mem.list_offers().await),
        }
    }

    /// List offers owned by one network.
    pub async fn list_offers_for_network(&self, network_id: NetworkId) -> Result<Vec<Offer>, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).list_for_network(network_id).await,
            Self::Memory(mem) => Ok(mem.list_offers_for_network(network_id).await),
        }
    }

    /// Load one offer.
    pub async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).get(id).await,
            Self::Memory(mem) => Ok(mem.get_offer(id).await),
        }
    }

    /// Load several offers.
    pub async fn get_offers(&self, ids: &[OfferId]) -> Result<Vec<Offer>, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).get_many(ids).await,
            Self::Memory(mem) => Ok(mem.get_offers(ids).await),
        }
    }

    /// Insert an offer.
    pub async fn insert_offer(&self, draft: &OfferDraft) -> Result<Offer, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).insert(draft).await,
            Self::Memory(mem) => mem.insert_offer(draft).await,
        }
    }

    /// Replace an offer.
    pub async fn update_offer(&self, id: OfferId, draft: &OfferDraft) -> Result<Option<Offer>, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).update(id, draft).await,
            Self::Memory(mem) => mem.update_offer(id, draft).await,
        }
    }

    /// Write back a complete offer record.
    pub async fn save_offer(&self, offer: &Offer) -> Result<Option<Offer>, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).save(offer).await,
            Self::Memory(mem) => mem.update_offer(offer.id, &draft_of(offer)).await,
        }
    }

    /// Delete an offer.
    pub async fn delete_offer(&self, id: OfferId) -> Result<Option<Offer>, DbError> {
        match self {
            Self::Postgres(pg) => OfferStore::new(pg.pool()).delete(id).await,
            Self::Memory(mem) => Ok(mem.delete_offer(id).await),
        }
    }

    // -----------------------------------------------------------------------
    // Banners and rotations
    // -----------------------------------------------------------------------

    /// List every banner, oldest first.
    pub async fn list_banners(&self) -> Result<Vec<Banner>, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).list().await,
            Self::Memory(mem) => Ok(mem.list_banners().await),
        }
    }

    /// Load one banner.
    pub async fn get_banner(&self, id: BannerId) -> Result<Option<Banner>, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).get(id).await,
            Self::Memory(mem) => Ok(mem.get_banner(id).await),
        }
    }

    /// Insert a banner.
    pub async fn insert_banner(&self, draft: &BannerDraft) -> Result<Banner, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).insert(draft).await,
            Self::Memory(mem) => Ok(mem.insert_banner(draft).await),
        }
    }

    /// Delete a banner, returning it and the rotations it was removed from.
    pub async fn delete_banner(&self, id: BannerId) -> Result<Option<(Banner, Vec<BannerRotation>)>, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).delete(id).await,
            Self::Memory(mem) => Ok(mem.delete_banner(id).await),
        }
    }

    /// List every rotation, oldest first.
    pub async fn list_rotations(&self) -> Result<Vec<BannerRotation>, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).list_rotations().await,
            Self::Memory(mem) => Ok(mem.list_rotations().await),
        }
    }

    /// Load one rotation.
    pub async fn get_rotation(&self, id: RotationId) -> Result<Option<BannerRotation>, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).get_rotation(id).await,
            Self::Memory(mem) => Ok(mem.get_rotation(id).await),
        }
    }

    /// Insert a rotation.
    pub async fn insert_rotation(&self, draft: &RotationDraft) -> Result<BannerRotation, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).insert_rotation(draft).await,
            Self::Memory(mem) => Ok(mem.insert_rotation(draft).await),
        }
    }

    /// Delete a rotation.
    pub async fn delete_rotation(&self, id: RotationId) -> Result<Option<BannerRotation>, DbError> {
        match self {
            Self::Postgres(pg) => BannerStore::new(pg.pool()).delete_rotation(id).await,
            Self::Memory(mem) => Ok(mem.delete_rotation(id).await),
        }
    }

    // -----------------------------------------------------------------------
    // Master data
    // -----------------------------------------------------------------------

    /// List master data, optionally for one category.
    pub async fn list_master_data(
        &self,
        category: Option<MasterDataCategory>,
    ) -> Result<Vec<MasterDataEntry>, DbError> {
        match self {
            Self::Postgres(pg) => MasterDataStore::new(pg.pool()).list(category).await,
            Self::Memory(mem) => Ok(mem.list_master_data(category).await),
        }
    }

    /// Insert a master data value.
    pub async fn insert_master_data(&self, draft: &MasterDataDraft) -> Result<MasterDataEntry, DbError> {
        match self {
            Self::Postgres(pg) => MasterDataStore::new(pg.pool()).insert(draft).await,
            Self::Memory(mem) => mem.insert_master_data(draft).await,
        }
    }

    /// Delete a master data value.
    pub async fn delete_master_data(&self, id: MasterDataId) -> Result<Option<MasterDataEntry>, DbError> {
        match self {
            Self::Postgres(pg) => MasterDataStore::new(pg.pool()).delete(id).await,
            Self::Memory(mem) => Ok(mem.delete_master_data(id).await),
        }
    }

    // -----------------------------------------------------------------------
    // Audit log
    // -----------------------------------------------------------------------

    /// Append an audit entry.
    pub async fn record_audit(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, DbError> {
        match self {
            Self::Postgres(pg) => AuditStore::new(pg.pool()).record(entry).await,
            Self::Memory(mem) => Ok(mem.record_audit(entry).await),
        }
    }

    /// List audit entries newest first.
    pub async fn list_audit(&self, entity: Option<&str>, limit: usize) -> Result<Vec<AuditLogEntry>, DbError> {
        match self {
            Self::Postgres(pg) => AuditStore::new(pg.pool()).list(entity, limit).await,
            Self::Memory(mem) => Ok(mem.list_audit(entity, limit).await),
        }
    }

    // -----------------------------------------------------------------------
    // Clicks
    // -----------------------------------------------------------------------

    /// Insert a click.
    pub async fn record_click(&self, click: &NewBannerClick) -> Result<BannerClick, DbError> {
        match self {
            Self::Postgres(pg) => ClickStore::new(pg.pool()).record(click).await,
            Self::Memory(mem) => mem.record_click(click).await,
        }
    }

    /// Raw clicks matching `filter`, newest first.
    pub async fn list_clicks(&self, filter: &ClickFilter) -> Result<Vec<BannerClick>, DbError> {
        match self {
            Self::Postgres(pg) => ClickStore::new(pg.pool()).list(filter).await,
            Self::Memory(mem) => Ok(mem.list_clicks(filter).await),
        }
    }

    /// Every click inside the window.
    pub async fn clicks_between(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<BannerClick>, DbError> {
        match self {
            Self::Postgres(pg) => ClickStore::new(pg.pool()).between(since, until).await,
            Self::Memory(mem) => Ok(mem.clicks_between(since, until).await),
        }
    }

    /// Per-banner click totals.
    pub async fn click_counts(&self) -> Result<Vec<BannerClickCount>, DbError> {
        match self {
            Self::Postgres(pg) => ClickStore::new(pg.pool()).counts().await,
            Self::Memory(mem) => Ok(mem.click_counts().await),
        }
    }

    // -----------------------------------------------------------------------
    // Network requests
    // -----------------------------------------------------------------------

    /// Insert a pending join request.
    pub async fn create_request(&self, draft: &NetworkRequestDraft) -> Result<NetworkRequest, DbError> {
        match self {
            Self::Postgres(pg) => RequestStore::new(pg.pool()).create(draft).await,
            Self::Memory(mem) => Ok(mem.create_request(draft).await),
        }
    }

    /// List join requests newest first.
    pub async fn list_requests(
        &self,
        status: Option<NetworkRequestStatus>,
    ) -> Result<Vec<NetworkRequest>, DbError> {
        match self {
            Self::Postgres(pg) => RequestStore::new(pg.pool()).list(status).await,
            Self::Memory(mem) => Ok(mem.list_requests(status).await),
        }
    }

    /// Load one join request.
    pub async fn get_request(&self, id: NetworkRequestId) -> Result<Option<NetworkRequest>, DbError> {
        match self {
            Self::Postgres(pg) => RequestStore::new(pg.pool()).get(id).await,
            Self::Memory(mem) => Ok(mem.get_request(id).await),
        }
    }

    /// Approve or reject a join request.
    pub async fn review_request(
        &self,
        id: NetworkRequestId,
        status: NetworkRequestStatus,
    ) -> Result<Option<NetworkRequest>, DbError> {
        match self {
            Self::Postgres(pg) => RequestStore::new(pg.pool()).review(id, status).await,
            Self::Memory(mem) => Ok(mem.review_request(id, status).await),
        }
    }
}
