//! Database operations for the singleton `session_credentials` row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const SINGLETON_ID: i16 = 1;

/// The stored cookie JSON plus the version used to guard writes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionCookieRow {
    pub cookie: Option<String>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Read the singleton row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the seeded row is missing, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_session_cookie(pool: &PgPool) -> Result<SessionCookieRow, DbError> {
    sqlx::query_as::<_, SessionCookieRow>(
        "SELECT cookie, version, updated_at FROM session_credentials WHERE id = $1",
    )
    .bind(SINGLETON_ID)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Overwrite the cookie only if the row still carries `expected_version`.
///
/// Returns the new version on success, or `None` when another writer got
/// there first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn compare_and_swap_session_cookie(
    pool: &PgPool,
    cookie: &str,
    expected_version: i64,
) -> Result<Option<i64>, DbError> {
    let version = sqlx::query_scalar::<_, i64>(
        "UPDATE session_credentials \
         SET cookie = $1, version = version + 1, updated_at = NOW() \
         WHERE id = $2 AND version = $3 \
         RETURNING version",
    )
    .bind(cookie)
    .bind(SINGLETON_ID)
    .bind(expected_version)
    .fetch_optional(pool)
    .await?;

    Ok(version)
}
