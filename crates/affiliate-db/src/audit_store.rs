//! Audit log persistence.

use affiliate_types::{AuditLogEntry, AuditLogId, NewAuditEntry};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::convert::{limit_to_db, parse_text};
use crate::error::DbError;

const TABLE: &str = "audit_logs";

/// Operations on the `audit_logs` table.
pub struct AuditStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditStore<'a> {
    /// Create a new audit store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the insert fails.
    pub async fn record(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, DbError> {
        let row = sqlx::query_as::<_, AuditRow>(
            r"INSERT INTO audit_logs (entity, entity_id, action, actor, changes)
              VALUES ($1, $2, $3, $4, $5)
              RETURNING id, entity, entity_id, action, actor, changes, created_at",
        )
        .bind(&entry.entity)
        .bind(entry.entity_id)
        .bind(entry.action.as_str())
        .bind(&entry.actor)
        .bind(&entry.changes)
        .fetch_one(self.pool)
        .await?;
        row.try_into()
    }

    /// List entries newest first, optionally for one entity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn list(&self, entity: Option<&str>, limit: usize) -> Result<Vec<AuditLogEntry>, DbError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r"SELECT id, entity, entity_id, action, actor, changes, created_at
              FROM audit_logs
              WHERE ($1::text IS NULL OR entity = $1)
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(entity)
        .bind(limit_to_db(limit))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }
}

/// A row from the `audit_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    /// Entry UUID.
    pub id: Uuid,
    /// Table name.
    pub entity: String,
    /// Changed row.
    pub entity_id: Uuid,
    /// Action text.
    pub action: String,
    /// Actor.
    pub actor: Option<String>,
    /// JSONB change description.
    pub changes: serde_json::Value,
    /// Record time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditLogEntry {
    type Error = DbError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AuditLogId(row.id),
            entity: row.entity,
            entity_id: row.entity_id,
            action: parse_text(TABLE, &row.action)?,
            actor: row.actor,
            changes: row.changes,
            created_at: row.created_at,
        })
    }
}
