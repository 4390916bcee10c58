//! Banner and banner rotation persistence.

use affiliate_types::{Banner, BannerDraft, BannerId, BannerRotation, RotationDraft, RotationId, Section};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::convert::{millis_from_db, millis_to_db, parse_text, parse_text_list};
use crate::error::DbError;

const BANNERS: &str = "banners";
const ROTATIONS: &str = "banner_rotations";

macro_rules! banner_columns {
    () => {
        "id, title, image_url, links, sections, expires_at, created_at"
    };
}

macro_rules! rotation_columns {
    () => {
        "id, name, banner_ids, section, rotation_duration_ms, expires_at, created_at"
    };
}

/// Operations on the `banners` and `banner_rotations` tables.
pub struct BannerStore<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerStore<'a> {
    /// Create a new banner store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Banners
    // -----------------------------------------------------------------------

    /// List every banner, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Corrupt`] if a stored section is unknown.
    pub async fn list(&self) -> Result<Vec<Banner>, DbError> {
        let rows = sqlx::query_as::<_, BannerRow>(concat!(
            "SELECT ",
            banner_columns!(),
            " FROM banners ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Banner::try_from).collect()
    }

    /// Load one banner.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn get(&self, id: BannerId) -> Result<Option<Banner>, DbError> {
        let row = sqlx::query_as::<_, BannerRow>(concat!(
            "SELECT ",
            banner_columns!(),
            " FROM banners WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(Banner::try_from).transpose()
    }

    /// Insert a banner.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the insert fails.
    pub async fn insert(&self, draft: &BannerDraft) -> Result<Banner, DbError> {
        let sections: Vec<String> = draft.sections.iter().map(|s| s.as_str().to_owned()).collect();
        let row = sqlx::query_as::<_, BannerRow>(concat!(
            "INSERT INTO banners (title, image_url, links, sections, expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING ",
            banner_columns!()
        ))
        .bind(&draft.title)
        .bind(&draft.image_url)
        .bind(&draft.links)
        .bind(&sections)
        .bind(draft.expires_at)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(banner_id = %row.id, "Inserted banner");
        row.try_into()
    }

    /// Delete a banner and strip it from every rotation that lists it.
    ///
    /// Returns the removed banner together with the rotations whose member
    /// list changed. Both statements run in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if either statement fails.
    pub async fn delete(&self, id: BannerId) -> Result<Option<(Banner, Vec<BannerRotation>)>, DbError> {
        let mut tx = self.pool.begin().await?;

        let rotations = sqlx::query_as::<_, RotationRow>(concat!(
            "UPDATE banner_rotations SET banner_ids = array_remove(banner_ids, $1) \
             WHERE $1 = ANY(banner_ids) RETURNING ",
            rotation_columns!()
        ))
        .bind(id.into_inner())
        .fetch_all(&mut *tx)
        .await?;

        let banner = sqlx::query_as::<_, BannerRow>(concat!(
            "DELETE FROM banners WHERE id = $1 RETURNING ",
            banner_columns!()
        ))
        .bind(id.into_inner())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(banner) = banner else {
            tx.rollback().await?;
            return Ok(None);
        };
        tx.commit().await?;

        let rotations = rotations
            .into_iter()
            .map(BannerRotation::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some((banner.try_into()?, rotations)))
    }

    // -----------------------------------------------------------------------
    // Rotations
    // -----------------------------------------------------------------------

    /// List every rotation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn list_rotations(&self) -> Result<Vec<BannerRotation>, DbError> {
        let rows = sqlx::query_as::<_, RotationRow>(concat!(
            "SELECT ",
            rotation_columns!(),
            " FROM banner_rotations ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(BannerRotation::try_from).collect()
    }

    /// Load one rotation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn get_rotation(&self, id: RotationId) -> Result<Option<BannerRotation>, DbError> {
        let row = sqlx::query_as::<_, RotationRow>(concat!(
            "SELECT ",
            rotation_columns!(),
            " FROM banner_rotations WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(BannerRotation::try_from).transpose()
    }

    /// Insert a rotation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the insert fails.
    pub async fn insert_rotation(&self, draft: &RotationDraft) -> Result<BannerRotation, DbError> {
        let members: Vec<Uuid> = draft.banner_ids.iter().map(|id| id.into_inner()).collect();
        let row = sqlx::query_as::<_, RotationRow>(concat!(
            "INSERT INTO banner_rotations (name, banner_ids, section, rotation_duration_ms, expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING ",
            rotation_columns!()
        ))
        .bind(&draft.name)
        .bind(&members)
        .bind(draft.section.as_str())
        .bind(millis_to_db(draft.rotation_duration_ms))
        .bind(draft.expires_at)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(rotation_id = %row.id, members = members.len(), "Inserted rotation");
        row.try_into()
    }

    /// Delete a rotation, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the delete fails.
    pub async fn delete_rotation(&self, id: RotationId) -> Result<Option<BannerRotation>, DbError> {
        let row = sqlx::query_as::<_, RotationRow>(concat!(
            "DELETE FROM banner_rotations WHERE id = $1 RETURNING ",
            rotation_columns!()
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(BannerRotation::try_from).transpose()
    }
}

/// A row from the `banners` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BannerRow {
    /// Banner UUID.
    pub id: Uuid,
    /// Display name.
    pub title: Option<String>,
    /// Image URL.
    pub image_url: String,
    /// Click-through links.
    pub links: Vec<String>,
    /// Section names.
    pub sections: Vec<String>,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BannerRow> for Banner {
    type Error = DbError;

    fn try_from(row: BannerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BannerId(row.id),
            title: row.title,
            image_url: row.image_url,
            links: row.links,
            sections: parse_text_list(BANNERS, &row.sections)?,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

/// A row from the `banner_rotations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RotationRow {
    /// Rotation UUID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Ordered member banners.
    pub banner_ids: Vec<Uuid>,
    /// Section name.
    pub section: String,
    /// Interval in milliseconds.
    pub rotation_duration_ms: i64,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RotationRow> for BannerRotation {
    type Error = DbError;

    fn try_from(row: RotationRow) -> Result<Self, Self::Error> {
        let section: Section = parse_text(ROTATIONS, &row.section)?;
        Ok(Self {
            id: RotationId(row.id),
            name: row.name,
            banner_ids: row.banner_ids.into_iter().map(BannerId).collect(),
            section,
            rotation_duration_ms: millis_from_db(ROTATIONS, row.rotation_duration_ms)?,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}
