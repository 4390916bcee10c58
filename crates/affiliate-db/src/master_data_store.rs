//! Master data pick-list persistence.

use affiliate_types::{MasterDataCategory, MasterDataDraft, MasterDataEntry, MasterDataId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::convert::parse_text;
use crate::error::DbError;

const TABLE: &str = "master_data";

/// Operations on the `master_data` table.
pub struct MasterDataStore<'a> {
    pool: &'a PgPool,
}

impl<'a> MasterDataStore<'a> {
    /// Create a new master data store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List entries, optionally restricted to one category, ordered by
    /// category and value.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn list(&self, category: Option<MasterDataCategory>) -> Result<Vec<MasterDataEntry>, DbError> {
        let rows = sqlx::query_as::<_, MasterDataRow>(
            r"SELECT id, category, value, created_at FROM master_data
              WHERE ($1::text IS NULL OR category = $1)
              ORDER BY category, lower(value)",
        )
        .bind(category.map(MasterDataCategory::as_str))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(MasterDataEntry::try_from).collect()
    }

    /// Insert an entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the value already exists in the
    /// category (case-insensitively).
    pub async fn insert(&self, draft: &MasterDataDraft) -> Result<MasterDataEntry, DbError> {
        let row = sqlx::query_as::<_, MasterDataRow>(
            r"INSERT INTO master_data (category, value) VALUES ($1, $2)
              RETURNING id, category, value, created_at",
        )
        .bind(draft.category.as_str())
        .bind(&draft.value)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, &format!("{} '{}'", draft.category, draft.value)))?;
        row.try_into()
    }

    /// Delete an entry, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the delete fails.
    pub async fn delete(&self, id: MasterDataId) -> Result<Option<MasterDataEntry>, DbError> {
        let row = sqlx::query_as::<_, MasterDataRow>(
            "DELETE FROM master_data WHERE id = $1 RETURNING id, category, value, created_at",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(MasterDataEntry::try_from).transpose()
    }
}

/// A row from the `master_data` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MasterDataRow {
    /// Entry UUID.
    pub id: Uuid,
    /// Category text.
    pub category: String,
    /// The value.
    pub value: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MasterDataRow> for MasterDataEntry {
    type Error = DbError;

    fn try_from(row: MasterDataRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MasterDataId(row.id),
            category: parse_text(TABLE, &row.category)?,
            value: row.value,
            created_at: row.created_at,
        })
    }
}
