//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors with additional context about which operation failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A write collided with a unique constraint.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A write referenced a row that does not exist.
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// A stored value could not be mapped back onto its Rust type.
    #[error("Corrupt row in {table}: {detail}")]
    Corrupt {
        /// Table the row came from.
        table: &'static str,
        /// What could not be decoded.
        detail: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Build a [`DbError::Corrupt`] for `table`.
    pub fn corrupt(table: &'static str, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            detail: detail.into(),
        }
    }

    /// Map constraint violations of a write onto [`DbError::Conflict`]
    /// (unique) or [`DbError::MissingReference`] (foreign key), leaving
    /// other errors as [`DbError::Postgres`].
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db.is_foreign_key_violation() {
                return Self::MissingReference(format!("{what} references a missing row"));
            }
        }
        Self::Postgres(err)
    }
}
