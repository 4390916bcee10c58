//! Offer persistence.

use affiliate_types::{NetworkId, Offer, OfferDraft, OfferId, OfferStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::convert::parse_text;
use crate::error::DbError;

const TABLE: &str = "offers";

macro_rules! offer_columns {
    () => {
        "id, network_id, name, description, image_url, tracking_url, payout, payout_type, \
         categories, tags, geo_targets, devices, vertical, status, featured, expires_at, \
         created_at, updated_at"
    };
}

/// Operations on the `offers` table.
pub struct OfferStore<'a> {
    pool: &'a PgPool,
}

impl<'a> OfferStore<'a> {
    /// Create a new offer store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every offer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Corrupt`] if a status cannot be decoded.
    pub async fn list(&self) -> Result<Vec<Offer>, DbError> {
        let rows = sqlx::query_as::<_, OfferRow>(concat!(
            "SELECT ",
            offer_columns!(),
            " FROM offers ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Offer::try_from).collect()
    }

    /// List offers owned by one network, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn list_for_network(&self, network_id: NetworkId) -> Result<Vec<Offer>, DbError> {
        let rows = sqlx::query_as::<_, OfferRow>(concat!(
            "SELECT ",
            offer_columns!(),
            " FROM offers WHERE network_id = $1 ORDER BY created_at, id"
        ))
        .bind(network_id.into_inner())
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Offer::try_from).collect()
    }

    /// Load one offer.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn get(&self, id: OfferId) -> Result<Option<Offer>, DbError> {
        let row = sqlx::query_as::<_, OfferRow>(concat!(
            "SELECT ",
            offer_columns!(),
            " FROM offers WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(Offer::try_from).transpose()
    }

    /// Load several offers. Ids that match nothing are left out.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn get_many(&self, ids: &[OfferId]) -> Result<Vec<Offer>, DbError> {
        let raw: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let rows = sqlx::query_as::<_, OfferRow>(concat!(
            "SELECT ",
            offer_columns!(),
            " FROM offers WHERE id = ANY($1)"
        ))
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Offer::try_from).collect()
    }

    /// Insert an offer.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, draft: &OfferDraft) -> Result<Offer, DbError> {
        let row = sqlx::query_as::<_, OfferRow>(concat!(
            "INSERT INTO offers (network_id, name, description, image_url, tracking_url, payout, \
             payout_type, categories, tags, geo_targets, devices, vertical, status, featured, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING ",
            offer_columns!()
        ))
        .bind(draft.network_id.map(NetworkId::into_inner))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.image_url)
        .bind(&draft.tracking_url)
        .bind(draft.payout)
        .bind(&draft.payout_type)
        .bind(&draft.categories)
        .bind(&draft.tags)
        .bind(&draft.geo_targets)
        .bind(&draft.devices)
        .bind(&draft.vertical)
        .bind(draft.status.as_str())
        .bind(draft.featured)
        .bind(draft.expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, "offer"))?;

        tracing::debug!(offer_id = %row.id, "Inserted offer");
        row.try_into()
    }

    /// Replace every editable field of an offer from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the update fails.
    pub async fn update(&self, id: OfferId, draft: &OfferDraft) -> Result<Option<Offer>, DbError> {
        let row = sqlx::query_as::<_, OfferRow>(concat!(
            "UPDATE offers SET network_id = $2, name = $3, description = $4, image_url = $5, \
             tracking_url = $6, payout = $7, payout_type = $8, categories = $9, tags = $10, \
             geo_targets = $11, devices = $12, vertical = $13, status = $14, featured = $15, \
             expires_at = $16, updated_at = now() \
             WHERE id = $1 RETURNING ",
            offer_columns!()
        ))
        .bind(id.into_inner())
        .bind(draft.network_id.map(NetworkId::into_inner))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.image_url)
        .bind(&draft.tracking_url)
        .bind(draft.payout)
        .bind(&draft.payout_type)
        .bind(&draft.categories)
        .bind(&draft.tags)
        .bind(&draft.geo_targets)
        .bind(&draft.devices)
        .bind(&draft.vertical)
        .bind(draft.status.as_str())
        .bind(draft.featured)
        .bind(draft.expires_at)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, "offer"))?;
        row.map(Offer::try_from).transpose()
    }

    /// Write back a full offer record (bulk edit path).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the update fails.
    pub async fn save(&self, offer: &Offer) -> Result<Option<Offer>, DbError> {
        self.update(offer.id, &draft_of(offer)).await
    }

    /// Delete an offer, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the delete fails.
    pub async fn delete(&self, id: OfferId) -> Result<Option<Offer>, DbError> {
        let row = sqlx::query_as::<_, OfferRow>(concat!(
            "DELETE FROM offers WHERE id = $1 RETURNING ",
            offer_columns!()
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(Offer::try_from).transpose()
    }
}

/// The editable fields of a stored offer.
pub fn draft_of(offer: &Offer) -> OfferDraft {
    OfferDraft {
        network_id: offer.network_id,
        name: offer.name.clone(),
        description: offer.description.clone(),
        image_url: offer.image_url.clone(),
        tracking_url: offer.tracking_url.clone(),
        payout: offer.payout,
        payout_type: offer.payout_type.clone(),
        categories: offer.categories.clone(),
        tags: offer.tags.clone(),
        geo_targets: offer.geo_targets.clone(),
        devices: offer.devices.clone(),
        vertical: offer.vertical.clone(),
        status: offer.status,
        featured: offer.featured,
        expires_at: offer.expires_at,
    }
}

/// A row from the `offers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    /// Offer UUID.
    pub id: Uuid,
    /// Owning network.
    pub network_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Image URL.
    pub image_url: Option<String>,
    /// Tracking URL.
    pub tracking_url: Option<String>,
    /// Payout.
    pub payout: Option<Decimal>,
    /// Payout model.
    pub payout_type: Option<String>,
    /// Categories.
    pub categories: Vec<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Geo targets.
    pub geo_targets: Vec<String>,
    /// Devices.
    pub devices: Vec<String>,
    /// Verticals.
    pub vertical: Vec<String>,
    /// Status text.
    pub status: String,
    /// Featured flag.
    pub featured: bool,
    /// Promotion end.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last replacement time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = DbError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        let status: OfferStatus = parse_text(TABLE, &row.status)?;
        Ok(Self {
            id: OfferId(row.id),
            network_id: row.network_id.map(NetworkId),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            tracking_url: row.tracking_url,
            payout: row.payout,
            payout_type: row.payout_type,
            categories: row.categories,
            tags: row.tags,
            geo_targets: row.geo_targets,
            devices: row.devices,
            vertical: row.vertical,
            status,
            featured: row.featured,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
