//! In-memory directory for tests and local development.
//!
//! Mirrors the `PostgreSQL` stores operation for operation, including the
//! side effects the schema enforces: deleting a network clears
//! `network_id` on its offers and drops its affiliate details, deleting a
//! banner strips it from rotations and drops its clicks, and master data is
//! unique per category ignoring case. Each table sits behind its own
//! [`RwLock`].

use affiliate_core::analytics::{ClickFilter, count_by_banner};
use affiliate_types::{
    AffiliateDetails, AffiliateDetailsDraft, AuditLogEntry, AuditLogId, Banner, BannerClick,
    BannerClickCount, BannerDraft, BannerId, BannerRotation, ClickId, MasterDataCategory,
    MasterDataDraft, MasterDataEntry, MasterDataId, Network, NetworkDraft, NetworkId,
    NetworkRequest, NetworkRequestDraft, NetworkRequestId, NetworkRequestStatus, NewAuditEntry,
    NewBannerClick, Offer, OfferDraft, OfferId, RotationDraft, RotationId,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::DbError;

/// Every table of the directory, held in process memory.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    networks: RwLock<Vec<Network>>,
    affiliate_details: RwLock<Vec<AffiliateDetails>>,
    offers: RwLock<Vec<Offer>>,
    banners: RwLock<Vec<Banner>>,
    rotations: RwLock<Vec<BannerRotation>>,
    master_data: RwLock<Vec<MasterDataEntry>>,
    audit_logs: RwLock<Vec<AuditLogEntry>>,
    clicks: RwLock<Vec<BannerClick>>,
    requests: RwLock<Vec<NetworkRequest>>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Networks
    // -----------------------------------------------------------------------

    /// List every network, oldest first.
    pub async fn list_networks(&self) -> Vec<Network> {
        self.networks.read().await.clone()
    }

    /// Load one network.
    pub async fn get_network(&self, id: NetworkId) -> Option<Network> {
        self.networks.read().await.iter().find(|n| n.id == id).cloned()
    }

    /// Insert a network.
    pub async fn insert_network(&self, draft: &NetworkDraft) -> Network {
        let now = Utc::now();
        let network = Network {
            id: NetworkId::new(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            logo_url: draft.logo_url.clone(),
            website_url: draft.website_url.clone(),
            signup_url: draft.signup_url.clone(),
            categories: draft.categories.clone(),
            tags: draft.tags.clone(),
            geo_targets: draft.geo_targets.clone(),
            payment_methods: draft.payment_methods.clone(),
            payment_frequency: draft.payment_frequency.clone(),
            minimum_payout: draft.minimum_payout,
            commission_type: draft.commission_type.clone(),
            rating: draft.rating,
            featured: draft.featured,
            created_at: now,
            updated_at: now,
        };
        self.networks.write().await.push(network.clone());
        network
    }

    /// Replace every editable field of a network.
    pub async fn update_network(&self, id: NetworkId, draft: &NetworkDraft) -> Option<Network> {
        let mut networks = self.networks.write().await;
        let network = networks.iter_mut().find(|n| n.id == id)?;
        network.name.clone_from(&draft.name);
        network.description.clone_from(&draft.description);
        network.logo_url.clone_from(&draft.logo_url);
        network.website_url.clone_from(&draft.website_url);
        network.signup_url.clone_from(&draft.signup_url);
        network.categories.clone_from(&draft.categories);
        network.tags.clone_from(&draft.tags);
        network.geo_targets.clone_from(&draft.geo_targets);
        network.payment_methods.clone_from(&draft.payment_methods);
        network.payment_frequency.clone_from(&draft.payment_frequency);
        network.minimum_payout = draft.minimum_payout;
        network.commission_type.clone_from(&draft.commission_type);
        network.rating = draft.rating;
        network.featured = draft.featured;
        network.updated_at = Utc::now();
        Some(network.clone())
    }

    /// Delete a network, clearing the owner of its offers.
    pub async fn delete_network(&self, id: NetworkId) -> Option<Network> {
        let removed = {
            let mut networks = self.networks.write().await;
            let pos = networks.iter().position(|n| n.id == id)?;
            networks.remove(pos)
        };
        self.affiliate_details.write().await.retain(|d| d.network_id != id);
        for offer in self.offers.write().await.iter_mut() {
            if offer.network_id == Some(id) {
                offer.network_id = None;
            }
        }
        Some(removed)
    }

    /// Load the private account details for a network.
    pub async fn affiliate_details(&self, id: NetworkId) -> Option<AffiliateDetails> {
        self.affiliate_details
            .read()
            .await
            .iter()
            .find(|d| d.network_id == id)
            .cloned()
    }

    /// Insert or replace the private account details for a network.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingReference`] if the network does not exist.
    pub async fn upsert_affiliate_details(
        &self,
        id: NetworkId,
        draft: &AffiliateDetailsDraft,
    ) -> Result<AffiliateDetails, DbError> {
        if self.get_network(id).await.is_none() {
            return Err(DbError::MissingReference(format!("network {id}")));
        }
        let details = AffiliateDetails {
            network_id: id,
            affiliate_id: draft.affiliate_id.clone(),
            manager_name: draft.manager_name.clone(),
            manager_email: draft.manager_email.clone(),
            notes: draft.notes.clone(),
            updated_at: Utc::now(),
        };
        let mut all = self.affiliate_details.write().await;
        match all.iter_mut().find(|d| d.network_id == id) {
            Some(existing) => *existing = details.clone(),
            None => all.push(details.clone()),
        }
        Ok(details)
    }

    // -----------------------------------------------------------------------
    // Offers
    // -----------------------------------------------------------------------

    /// List every offer, oldest first.
    pub async fn list_offers(&self) -> Vec<Offer> {
        self.offers.read().await.clone()
    }

    /// List offers owned by one network.
    pub async fn list_offers_for_network(&self, network_id: NetworkId) -> Vec<Offer> {
        self.offers
            .read()
            .await
            .iter()
            .filter(|o| o.network_id == Some(network_id))
            .cloned()
            .collect()
    }

    /// Load one offer.
    pub async fn get_offer(&self, id: OfferId) -> Option<Offer> {
        self.offers.read().await.iter().find(|o| o.id == id).cloned()
    }

    /// Load several offers. Ids that match nothing are left out.
    pub async fn get_offers(&self, ids: &[OfferId]) -> Vec<Offer> {
        self.offers
            .read()
            .await
            .iter()
            .filter(|o| ids.contains(&o.id))
            .cloned()
            .collect()
    }

    /// Insert an offer.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingReference`] if `network_id` names no network.
    pub async fn insert_offer(&self, draft: &OfferDraft) -> Result<Offer, DbError> {
        self.check_network_ref(draft.network_id).await?;
        let now = Utc::now();
        let offer = Offer {
            id: OfferId::new(),
            network_id: draft.network_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            image_url: draft.image_url.clone(),
            tracking_url: draft.tracking_url.clone(),
            payout: draft.payout,
            payout_type: draft.payout_type.clone(),
            categories: draft.categories.clone(),
            tags: draft.tags.clone(),
            geo_targets: draft.geo_targets.clone(),
            devices: draft.devices.clone(),
            vertical: draft.vertical.clone(),
            status: draft.status,
            featured: draft.featured,
            expires_at: draft.expires_at,
            created_at: now,
            updated_at: now,
        };
        self.offers.write().await.push(offer.clone());
        Ok(offer)
    }

    /// Replace every editable field of an offer.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingReference`] if `network_id` names no network.
    pub async fn update_offer(&self, id: OfferId, draft: &OfferDraft) -> Result<Option<Offer>, DbError> {
        self.check_network_ref(draft.network_id).await?;
        let mut offers = self.offers.write().await;
        let Some(offer) = offers.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        offer.network_id = draft.network_id;
        offer.name.clone_from(&draft.name);
        offer.description.clone_from(&draft.description);
        offer.image_url.clone_from(&draft.image_url);
        offer.tracking_url.clone_from(&draft.tracking_url);
        offer.payout = draft.payout;
        offer.payout_type.clone_from(&draft.payout_type);
        offer.categories.clone_from(&draft.categories);
        offer.tags.clone_from(&draft.tags);
        offer.geo_targets.clone_from(&draft.geo_targets);
        offer.devices.clone_from(&draft.devices);
        offer.vertical.clone_from(&draft.vertical);
        offer.status = draft.status;
        offer.featured = draft.featured;
        offer.expires_at = draft.expires_at;
        offer.updated_at = Utc::now();
        Ok(Some(offer.clone()))
    }

    /// Delete an offer.
    pub async fn delete_offer(&self, id: OfferId) -> Option<Offer> {
        let mut offers = self.offers.write().await;
        let pos = offers.iter().position(|o| o.id == id)?;
        Some(offers.remove(pos))
    }

    async fn check_network_ref(&self, network_id: Option<NetworkId>) -> Result<(), DbError> {
        match network_id {
            Some(id) if self.get_network(id).await.is_none() => {
                Err(DbError::MissingReference(format!("network {id}")))
            }
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Banners and rotations
    // -----------------------------------------------------------------------

    /// List every banner, oldest first.
    pub async fn list_banners(&self) -> Vec<Banner> {
        self.banners.read().await.clone()
    }

    /// Load one banner.
    pub async fn get_banner(&self, id: BannerId) -> Option<Banner> {
        self.banners.read().await.iter().find(|b| b.id == id).cloned()
    }

    /// Insert a banner.
    pub async fn insert_banner(&self, draft: &BannerDraft) -> Banner {
        let banner = Banner {
            id: BannerId::new(),
            title: draft.title.clone(),
            image_url: draft.image_url.clone(),
            links: draft.links.clone(),
            sections: draft.sections.clone(),
            expires_at: draft.expires_at,
            created_at: Utc::now(),
        };
        self.banners.write().await.push(banner.clone());
        banner
    }

    /// Delete a banner, strip it from rotations, and drop its clicks.
    ///
    /// Returns the removed banner and the rotations whose member list
    /// changed.
    pub async fn delete_banner(&self, id: BannerId) -> Option<(Banner, Vec<BannerRotation>)> {
        let removed = {
            let mut banners = self.banners.write().await;
            let pos = banners.iter().position(|b| b.id == id)?;
            banners.remove(pos)
        };
        let mut touched = Vec::new();
        for rotation in self.rotations.write().await.iter_mut() {
            if rotation.banner_ids.contains(&id) {
                rotation.banner_ids.retain(|member| *member != id);
                touched.push(rotation.clone());
            }
        }
        self.clicks.write().await.retain(|c| c.banner_id != id);
        Some((removed, touched))
    }

    /// List every rotation, oldest first.
    pub async fn list_rotations(&self) -> Vec<BannerRotation> {
        self.rotations.read().await.clone()
    }

    /// Load one rotation.
    pub async fn get_rotation(&self, id: RotationId) -> Option<BannerRotation> {
        self.rotations.read().await.iter().find(|r| r.id == id).cloned()
    }

    /// Insert a rotation.
    pub async fn insert_rotation(&self, draft: &RotationDraft) -> BannerRotation {
        let rotation = BannerRotation {
            id: RotationId::new(),
            name: draft.name.clone(),
            banner_ids: draft.banner_ids.clone(),
            section: draft.section,
            rotation_duration_ms: draft.rotation_duration_ms,
            expires_at: draft.expires_at,
            created_at: Utc::now(),
        };
        self.rotations.write().await.push(rotation.clone());
        rotation
    }

    /// Delete a rotation.
    pub async fn delete_rotation(&self, id: RotationId) -> Option<BannerRotation> {
        let mut rotations = self.rotations.write().await;
        let pos = rotations.iter().position(|r| r.id == id)?;
        Some(rotations.remove(pos))
    }

    // -----------------------------------------------------------------------
    // Master data
    // -----------------------------------------------------------------------

    /// List entries ordered by category and value.
    pub async fn list_master_data(&self, category: Option<MasterDataCategory>) -> Vec<MasterDataEntry> {
        let mut entries: Vec<MasterDataEntry> = self
            .master_data
            .read()
            .await
            .iter()
            .filter(|e| category.is_none_or(|c| e.category == c))
            .cloned()
            .collect();
        entries.sort_by_cached_key(|e| (e.category.as_str(), e.value.to_lowercase()));
        entries
    }

    /// Insert an entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the value already exists in the
    /// category, ignoring case.
    pub async fn insert_master_data(&self, draft: &MasterDataDraft) -> Result<MasterDataEntry, DbError> {
        let mut entries = self.master_data.write().await;
        let taken = entries
            .iter()
            .any(|e| e.category == draft.category && e.value.to_lowercase() == draft.value.to_lowercase());
        if taken {
            return Err(DbError::Conflict(format!(
                "{} '{}' already exists",
                draft.category, draft.value
            )));
        }
        let entry = MasterDataEntry {
            id: MasterDataId::new(),
            category: draft.category,
            value: draft.value.clone(),
            created_at: Utc::now(),
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    /// Delete an entry.
    pub async fn delete_master_data(&self, id: MasterDataId) -> Option<MasterDataEntry> {
        let mut entries = self.master_data.write().await;
        let pos = entries.iter().position(|e| e.id == id)?;
        Some(entries.remove(pos))
    }

    // -----------------------------------------------------------------------
    // Audit log
    // -----------------------------------------------------------------------

    /// Append an audit entry.
    pub async fn record_audit(&self, entry: &NewAuditEntry) -> AuditLogEntry {
        let stored = AuditLogEntry {
            id: AuditLogId::new(),
            entity: entry.entity.clone(),
            entity_id: entry.entity_id,
            action: entry.action,
            actor: entry.actor.clone(),
            changes: entry.changes.clone(),
            created_at: Utc::now(),
        };
        self.audit_logs.write().await.push(stored.clone());
        stored
    }

    /// List audit entries newest first.
    pub async fn list_audit(&self, entity: Option<&str>, limit: usize) -> Vec<AuditLogEntry> {
        self.audit_logs
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| entity.is_none_or(|name| e.entity == name))
            .take(limit)
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Clicks
    // -----------------------------------------------------------------------

    /// Insert a click.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingReference`] for an unknown banner.
    pub async fn record_click(&self, click: &NewBannerClick) -> Result<BannerClick, DbError> {
        if self.get_banner(click.banner_id).await.is_none() {
            return Err(DbError::MissingReference(format!("banner {}", click.banner_id)));
        }
        let stored = BannerClick {
            id: ClickId::new(),
            banner_id: click.banner_id,
            user_id: click.user_id.clone(),
            ip_address: click.ip_address.clone(),
            country: click.country.clone(),
            user_agent: click.user_agent.clone(),
            clicked_at: Utc::now(),
        };
        self.clicks.write().await.push(stored.clone());
        Ok(stored)
    }

    /// Raw clicks matching `filter`, newest first.
    pub async fn list_clicks(&self, filter: &ClickFilter) -> Vec<BannerClick> {
        self.clicks
            .read()
            .await
            .iter()
            .rev()
            .filter(|c| filter.matches(c))
            .take(filter.effective_limit())
            .cloned()
            .collect()
    }

    /// Every click inside the window, oldest first.
    pub async fn clicks_between(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<BannerClick> {
        let window = ClickFilter {
            since,
            until,
            ..ClickFilter::default()
        };
        self.clicks
            .read()
            .await
            .iter()
            .filter(|c| window.matches(c))
            .cloned()
            .collect()
    }

    /// Per-banner click totals.
    pub async fn click_counts(&self) -> Vec<BannerClickCount> {
        count_by_banner(&self.clicks.read().await)
    }

    // -----------------------------------------------------------------------
    // Network requests
    // -----------------------------------------------------------------------

    /// Insert a pending request.
    pub async fn create_request(&self, draft: &NetworkRequestDraft) -> NetworkRequest {
        let request = NetworkRequest {
            id: NetworkRequestId::new(),
            network_name: draft.network_name.clone(),
            website_url: draft.website_url.clone(),
            contact_email: draft.contact_email.clone(),
            message: draft.message.clone(),
            status: NetworkRequestStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        self.requests.write().await.push(request.clone());
        request
    }

    /// List requests newest first.
    pub async fn list_requests(&self, status: Option<NetworkRequestStatus>) -> Vec<NetworkRequest> {
        self.requests
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect()
    }

    /// Load one request.
    pub async fn get_request(&self, id: NetworkRequestId) -> Option<NetworkRequest> {
        self.requests.read().await.iter().find(|r| r.id == id).cloned()
    }

    /// Move a request to `status` and stamp `reviewed_at`.
    pub async fn review_request(
        &self,
        id: NetworkRequestId,
        status: NetworkRequestStatus,
    ) -> Option<NetworkRequest> {
        let mut requests = self.requests.write().await;
        let request = requests.iter_mut().find(|r| r.id == id)?;
        request.status = status;
        request.reviewed_at = Some(Utc::now());
        Some(request.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use affiliate_types::{AuditAction, Section};

    use super::*;

    fn network_draft(name: &str) -> NetworkDraft {
        NetworkDraft {
            name: name.to_owned(),
            ..NetworkDraft::default()
        }
    }

    fn banner_draft(section: Section) -> BannerDraft {
        BannerDraft {
            image_url: "https://cdn.example.com/b.png".to_owned(),
            sections: vec![section],
            ..BannerDraft::default()
        }
    }

    #[tokio::test]
    async fn deleting_a_network_orphans_its_offers() {
        let dir = MemoryDirectory::new();
        let network = dir.insert_network(&network_draft("Acme")).await;
        let offer = dir
            .insert_offer(&OfferDraft {
                network_id: Some(network.id),
                name: "VPN".to_owned(),
                ..OfferDraft::default()
            })
            .await
            .unwrap();
        dir.upsert_affiliate_details(network.id, &AffiliateDetailsDraft::default())
            .await
            .unwrap();

        assert!(dir.delete_network(network.id).await.is_some());
        assert_eq!(dir.get_offer(offer.id).await.unwrap().network_id, None);
        assert!(dir.affiliate_details(network.id).await.is_none());
        assert!(dir.delete_network(network.id).await.is_none());
    }

    #[tokio::test]
    async fn offers_must_reference_an_existing_network() {
        let dir = MemoryDirectory::new();
        let err = dir
            .insert_offer(&OfferDraft {
                network_id: Some(NetworkId::new()),
                name: "Orphan".to_owned(),
                ..OfferDraft::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::MissingReference(_)));
    }

    #[tokio::test]
    async fn deleting_a_banner_strips_it_from_rotations() {
        let dir = MemoryDirectory::new();
        let a = dir.insert_banner(&banner_draft(Section::Top)).await;
        let b = dir.insert_banner(&banner_draft(Section::Top)).await;
        let rotation = dir
            .insert_rotation(&RotationDraft {
                name: "Hero".to_owned(),
                banner_ids: vec![a.id, b.id],
                section: Section::Top,
                rotation_duration_ms: 3_000,
                expires_at: None,
            })
            .await;
        dir.record_click(&NewBannerClick {
            banner_id: a.id,
            user_id: None,
            ip_address: Some("203.0.113.9".to_owned()),
            country: None,
            user_agent: None,
        })
        .await
        .unwrap();

        let (removed, touched) = dir.delete_banner(a.id).await.unwrap();
        assert_eq!(removed.id, a.id);
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].banner_ids, vec![b.id]);
        assert_eq!(dir.get_rotation(rotation.id).await.unwrap().banner_ids, vec![b.id]);
        assert!(dir.click_counts().await.is_empty());
    }

    #[tokio::test]
    async fn master_data_is_unique_per_category_ignoring_case() {
        let dir = MemoryDirectory::new();
        let draft = MasterDataDraft {
            category: MasterDataCategory::Tag,
            value: "Finance".to_owned(),
        };
        dir.insert_master_data(&draft).await.unwrap();

        let dup = MasterDataDraft {
            value: "finance".to_owned(),
            ..draft.clone()
        };
        assert!(matches!(
            dir.insert_master_data(&dup).await,
            Err(DbError::Conflict(_))
        ));

        let other = MasterDataDraft {
            category: MasterDataCategory::Category,
            ..dup
        };
        dir.insert_master_data(&other).await.unwrap();
        assert_eq!(dir.list_master_data(None).await.len(), 2);
        assert_eq!(dir.list_master_data(Some(MasterDataCategory::Tag)).await.len(), 1);
    }

    #[tokio::test]
    async fn audit_log_lists_newest_first() {
        let dir = MemoryDirectory::new();
        for entity in ["offers", "banners", "offers"] {
            dir.record_audit(&NewAuditEntry {
                entity: entity.to_owned(),
                entity_id: uuid::Uuid::nil(),
                action: AuditAction::Create,
                actor: Some("admin".to_owned()),
                changes: serde_json::json!({}),
            })
            .await;
        }
        let all = dir.list_audit(None, 10).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].entity, "offers");
        assert_eq!(all[1].entity, "banners");
        assert_eq!(dir.list_audit(Some("offers"), 1).await.len(), 1);
    }

    #[tokio::test]
    async fn reviewing_a_request_stamps_it() {
        let dir = MemoryDirectory::new();
        let request = dir
            .create_request(&NetworkRequestDraft {
                network_name: "Newco".to_owned(),
                website_url: None,
                contact_email: "ops@newco.example".to_owned(),
                message: String::new(),
            })
            .await;
        assert_eq!(request.status, NetworkRequestStatus::Pending);

        let reviewed = dir
            .review_request(request.id, NetworkRequestStatus::Approved)
            .await
            .unwrap();
        assert_eq!(reviewed.status, NetworkRequestStatus::Approved);
        assert!(reviewed.reviewed_at.is_some());
        assert!(dir.list_requests(Some(NetworkRequestStatus::Pending)).await.is_empty());
        assert!(dir.review_request(NetworkRequestId::new(), NetworkRequestStatus::Rejected).await.is_none());
    }
}
