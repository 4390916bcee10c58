//! Network join request persistence.

use affiliate_types::{NetworkRequest, NetworkRequestDraft, NetworkRequestId, NetworkRequestStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::convert::parse_text;
use crate::error::DbError;

const TABLE: &str = "network_requests";

macro_rules! request_columns {
    () => {
        "id, network_name, website_url, contact_email, message, status, created_at, reviewed_at"
    };
}

/// Operations on the `network_requests` table.
pub struct RequestStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RequestStore<'a> {
    /// Create a new request store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending request.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the insert fails.
    pub async fn create(&self, draft: &NetworkRequestDraft) -> Result<NetworkRequest, DbError> {
        let row = sqlx::query_as::<_, RequestRow>(concat!(
            "INSERT INTO network_requests (network_name, website_url, contact_email, message) \
             VALUES ($1, $2, $3, $4) RETURNING ",
            request_columns!()
        ))
        .bind(&draft.network_name)
        .bind(&draft.website_url)
        .bind(&draft.contact_email)
        .bind(&draft.message)
        .fetch_one(self.pool)
        .await?;
        row.try_into()
    }

    /// List requests newest first, optionally in one state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn list(&self, status: Option<NetworkRequestStatus>) -> Result<Vec<NetworkRequest>, DbError> {
        let rows = sqlx::query_as::<_, RequestRow>(concat!(
            "SELECT ",
            request_columns!(),
            " FROM network_requests WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status.map(NetworkRequestStatus::as_str))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(NetworkRequest::try_from).collect()
    }

    /// Load one request.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn get(&self, id: NetworkRequestId) -> Result<Option<NetworkRequest>, DbError> {
        let row = sqlx::query_as::<_, RequestRow>(concat!(
            "SELECT ",
            request_columns!(),
            " FROM network_requests WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(NetworkRequest::try_from).transpose()
    }

    /// Move a request to `status` and stamp `reviewed_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the update fails.
    pub async fn review(
        &self,
        id: NetworkRequestId,
        status: NetworkRequestStatus,
    ) -> Result<Option<NetworkRequest>, DbError> {
        let row = sqlx::query_as::<_, RequestRow>(concat!(
            "UPDATE network_requests SET status = $2, reviewed_at = now() \
             WHERE id = $1 RETURNING ",
            request_columns!()
        ))
        .bind(id.into_inner())
        .bind(status.as_str())
        .fetch_optional(self.pool)
        .await?;
        row.map(NetworkRequest::try_from).transpose()
    }
}

/// A row from the `network_requests` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RequestRow {
    /// Request UUID.
    pub id: Uuid,
    /// Network name.
    pub network_name: String,
    /// Website.
    pub website_url: Option<String>,
    /// Reply address.
    pub contact_email: String,
    /// Message.
    pub message: String,
    /// Status text.
    pub status: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Review time.
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for NetworkRequest {
    type Error = DbError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NetworkRequestId(row.id),
            network_name: row.network_name,
            website_url: row.website_url,
            contact_email: row.contact_email,
            message: row.message,
            status: parse_text(TABLE, &row.status)?,
            created_at: row.created_at,
            reviewed_at: row.reviewed_at,
        })
    }
}
