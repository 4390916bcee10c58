//! Network and affiliate-details persistence.

use affiliate_types::{AffiliateDetails, AffiliateDetailsDraft, Network, NetworkDraft, NetworkId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

macro_rules! network_columns {
    () => {
        "id, name, description, logo_url, website_url, signup_url, categories, tags, \
         geo_targets, payment_methods, payment_frequency, minimum_payout, commission_type, \
         rating, featured, created_at, updated_at"
    };
}

/// Operations on the `networks` and `affiliate_details` tables.
pub struct NetworkStore<'a> {
    pool: &'a PgPool,
}

impl<'a> NetworkStore<'a> {
    /// Create a new network store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every network, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list(&self) -> Result<Vec<Network>, DbError> {
        let rows = sqlx::query_as::<_, NetworkRow>(concat!(
            "SELECT ",
            network_columns!(),
            " FROM networks ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Network::from).collect())
    }

    /// Load one network.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, id: NetworkId) -> Result<Option<Network>, DbError> {
        let row = sqlx::query_as::<_, NetworkRow>(concat!(
            "SELECT ",
            network_columns!(),
            " FROM networks WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Network::from))
    }

    /// Insert a network.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, draft: &NetworkDraft) -> Result<Network, DbError> {
        let row = sqlx::query_as::<_, NetworkRow>(concat!(
            "INSERT INTO networks (name, description, logo_url, website_url, signup_url, \
             categories, tags, geo_targets, payment_methods, payment_frequency, minimum_payout, \
             commission_type, rating, featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING ",
            network_columns!()
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.logo_url)
        .bind(&draft.website_url)
        .bind(&draft.signup_url)
        .bind(&draft.categories)
        .bind(&draft.tags)
        .bind(&draft.geo_targets)
        .bind(&draft.payment_methods)
        .bind(&draft.payment_frequency)
        .bind(draft.minimum_payout)
        .bind(&draft.commission_type)
        .bind(draft.rating)
        .bind(draft.featured)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(network_id = %row.id, "Inserted network");
        Ok(row.into())
    }

    /// Replace every editable field of a network.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn update(&self, id: NetworkId, draft: &NetworkDraft) -> Result<Option<Network>, DbError> {
        let row = sqlx::query_as::<_, NetworkRow>(concat!(
            "UPDATE networks SET name = $2, description = $3, logo_url = $4, website_url = $5, \
             signup_url = $6, categories = $7, tags = $8, geo_targets = $9, payment_methods = $10, \
             payment_frequency = $11, minimum_payout = $12, commission_type = $13, rating = $14, \
             featured = $15, updated_at = now() \
             WHERE id = $1 RETURNING ",
            network_columns!()
        ))
        .bind(id.into_inner())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.logo_url)
        .bind(&draft.website_url)
        .bind(&draft.signup_url)
        .bind(&draft.categories)
        .bind(&draft.tags)
        .bind(&draft.geo_targets)
        .bind(&draft.payment_methods)
        .bind(&draft.payment_frequency)
        .bind(draft.minimum_payout)
        .bind(&draft.commission_type)
        .bind(draft.rating)
        .bind(draft.featured)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Network::from))
    }

    /// Delete a network, returning the removed row.
    ///
    /// Offers owned by the network keep existing with `network_id` cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete(&self, id: NetworkId) -> Result<Option<Network>, DbError> {
        let row = sqlx::query_as::<_, NetworkRow>(concat!(
            "DELETE FROM networks WHERE id = $1 RETURNING ",
            network_columns!()
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Network::from))
    }

    /// Load the private account details for a network.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn affiliate_details(&self, id: NetworkId) -> Result<Option<AffiliateDetails>, DbError> {
        let row = sqlx::query_as::<_, AffiliateDetailsRow>(
            r"SELECT network_id, affiliate_id, manager_name, manager_email, notes, updated_at
              FROM affiliate_details WHERE network_id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(AffiliateDetails::from))
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
        let row = sqlx::query_as::<_, AffiliateDetailsRow>(
            r"INSERT INTO affiliate_details (network_id, affiliate_id, manager_name, manager_email, notes)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (network_id) DO UPDATE SET
                affiliate_id = EXCLUDED.affiliate_id,
                manager_name = EXCLUDED.manager_name,
                manager_email = EXCLUDED.manager_email,
                notes = EXCLUDED.notes,
                updated_at = now()
              RETURNING network_id, affiliate_id, manager_name, manager_email, notes, updated_at",
        )
        .bind(id.into_inner())
        .bind(&draft.affiliate_id)
        .bind(&draft.manager_name)
        .bind(&draft.manager_email)
        .bind(&draft.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, "affiliate details"))?;
        Ok(row.into())
    }
}

/// A row from the `networks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NetworkRow {
    /// Network UUID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Website URL.
    pub website_url: Option<String>,
    /// Sign-up URL.
    pub signup_url: Option<String>,
    /// Categories.
    pub categories: Vec<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Geo targets.
    pub geo_targets: Vec<String>,
    /// Payment methods.
    pub payment_methods: Vec<String>,
    /// Payout cadence.
    pub payment_frequency: Option<String>,
    /// Minimum payout.
    pub minimum_payout: Option<Decimal>,
    /// Commission model.
    pub commission_type: Option<String>,
    /// Rating.
    pub rating: Option<Decimal>,
    /// Featured flag.
    pub featured: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last replacement time.
    pub updated_at: DateTime<Utc>,
}

impl From<NetworkRow> for Network {
    fn from(row: NetworkRow) -> Self {
        Self {
            id: NetworkId(row.id),
            name: row.name,
            description: row.description,
            logo_url: row.logo_url,
            website_url: row.website_url,
            signup_url: row.signup_url,
            categories: row.categories,
            tags: row.tags,
            geo_targets: row.geo_targets,
            payment_methods: row.payment_methods,
            payment_frequency: row.payment_frequency,
            minimum_payout: row.minimum_payout,
            commission_type: row.commission_type,
            rating: row.rating,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `affiliate_details` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AffiliateDetailsRow {
    /// Owning network.
    pub network_id: Uuid,
    /// Affiliate id with the network.
    pub affiliate_id: Option<String>,
    /// Account manager.
    pub manager_name: Option<String>,
    /// Account manager email.
    pub manager_email: Option<String>,
    /// Notes.
    pub notes: String,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
}

impl From<AffiliateDetailsRow> for AffiliateDetails {
    fn from(row: AffiliateDetailsRow) -> Self {
        Self {
            network_id: NetworkId(row.network_id),
            affiliate_id: row.affiliate_id,
            manager_name: row.manager_name,
            manager_email: row.manager_email,
            notes: row.notes,
            updated_at: row.updated_at,
        }
    }
}
