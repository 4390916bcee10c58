//! Banner click persistence and the `banner_click_counts` view.

use affiliate_core::analytics::ClickFilter;
use affiliate_types::{BannerClick, BannerClickCount, BannerId, ClickId, NewBannerClick};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::convert::limit_to_db;
use crate::error::DbError;

macro_rules! click_columns {
    () => {
        "id, banner_id, user_id, ip_address, country, user_agent, clicked_at"
    };
}

/// Operations on the `banner_clicks` table.
pub struct ClickStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ClickStore<'a> {
    /// Create a new click store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a click.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingReference`] for an unknown banner.
    pub async fn record(&self, click: &NewBannerClick) -> Result<BannerClick, DbError> {
        let row = sqlx::query_as::<_, ClickRow>(concat!(
            "INSERT INTO banner_clicks (banner_id, user_id, ip_address, country, user_agent) \
             VALUES ($1, $2, $3, $4, $5) RETURNING ",
            click_columns!()
        ))
        .bind(click.banner_id.into_inner())
        .bind(&click.user_id)
        .bind(&click.ip_address)
        .bind(&click.country)
        .bind(&click.user_agent)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_write(e, "click"))?;
        Ok(row.into())
    }

    /// Raw clicks matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn list(&self, filter: &ClickFilter) -> Result<Vec<BannerClick>, DbError> {
        let rows = sqlx::query_as::<_, ClickRow>(concat!(
            "SELECT ",
            click_columns!(),
            " FROM banner_clicks \
             WHERE ($1::timestamptz IS NULL OR clicked_at >= $1) \
               AND ($2::timestamptz IS NULL OR clicked_at < $2) \
               AND ($3::uuid IS NULL OR banner_id = $3) \
             ORDER BY clicked_at DESC, id DESC \
             LIMIT $4"
        ))
        .bind(filter.since)
        .bind(filter.until)
        .bind(filter.banner_id.map(BannerId::into_inner))
        .bind(limit_to_db(filter.effective_limit()))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(BannerClick::from).collect())
    }

    /// Every click inside the window, unbounded, for summaries.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn between(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<BannerClick>, DbError> {
        let rows = sqlx::query_as::<_, ClickRow>(concat!(
            "SELECT ",
            click_columns!(),
            " FROM banner_clicks \
             WHERE ($1::timestamptz IS NULL OR clicked_at >= $1) \
               AND ($2::timestamptz IS NULL OR clicked_at < $2) \
             ORDER BY clicked_at"
        ))
        .bind(since)
        .bind(until)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(BannerClick::from).collect())
    }

    /// Per-banner totals from the `banner_click_counts` view.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn counts(&self) -> Result<Vec<BannerClickCount>, DbError> {
        let rows = sqlx::query_as::<_, ClickCountRow>(
            "SELECT banner_id, clicks, unique_users, last_clicked_at FROM banner_click_counts",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| BannerClickCount {
                banner_id: BannerId(row.banner_id),
                clicks: row.clicks,
                unique_users: row.unique_users,
                last_clicked_at: row.last_clicked_at,
            })
            .collect())
    }
}

/// A row from the `banner_clicks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClickRow {
    /// Click UUID.
    pub id: Uuid,
    /// Clicked banner.
    pub banner_id: Uuid,
    /// User id.
    pub user_id: Option<String>,
    /// Caller IP.
    pub ip_address: Option<String>,
    /// Resolved country.
    pub country: Option<String>,
    /// Caller user agent.
    pub user_agent: Option<String>,
    /// Click time.
    pub clicked_at: DateTime<Utc>,
}

impl From<ClickRow> for BannerClick {
    fn from(row: ClickRow) -> Self {
        Self {
            id: ClickId(row.id),
            banner_id: BannerId(row.banner_id),
            user_id: row.user_id,
            ip_address: row.ip_address,
            country: row.country,
            user_agent: row.user_agent,
            clicked_at: row.clicked_at,
        }
    }
}

/// A row from the `banner_click_counts` view.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ClickCountRow {
    banner_id: Uuid,
    clicks: i64,
    unique_users: i64,
    last_clicked_at: Option<DateTime<Utc>>,
}
