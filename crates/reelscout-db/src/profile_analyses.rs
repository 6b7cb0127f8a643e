//! Database operations for the `profile_analyses` table.

use chrono::{DateTime, Utc};
use reelscout_core::ScrapeResult;
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `profile_analyses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileAnalysisRow {
    pub id: i64,
    pub insta_username: String,
    pub scraped_data: Value,
    pub analysis: Value,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileAnalysisRow {
    /// Decode the stored scrape back into its typed form.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Encode`] if the stored JSON no longer matches the
    /// record shape.
    pub fn scrape_result(&self) -> Result<ScrapeResult, DbError> {
        Ok(serde_json::from_value(self.scraped_data.clone())?)
    }
}

pub struct NewProfileAnalysis<'a> {
    pub insta_username: &'a str,
    pub scraped_data: &'a ScrapeResult,
    pub analysis: &'a Value,
    pub category: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

const SELECT_COLUMNS: &str =
    "SELECT id, insta_username, scraped_data, analysis, category, created_at, updated_at \
     FROM profile_analyses";

/// Insert or replace the record for a handle and return the stored row.
///
/// Re-running for the same handle overwrites the scrape, analysis and
/// category and bumps `updated_at`, so a retried write is harmless.
///
/// # Errors
///
/// Returns [`DbError::Encode`] if the scrape cannot be serialized, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_profile_analysis(
    pool: &PgPool,
    record: &NewProfileAnalysis<'_>,
) -> Result<ProfileAnalysisRow, DbError> {
    let scraped_data = serde_json::to_value(record.scraped_data)?;

    let row = sqlx::query_as::<_, ProfileAnalysisRow>(
        "INSERT INTO profile_analyses (insta_username, scraped_data, analysis, category) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (insta_username) DO UPDATE SET \
           scraped_data = EXCLUDED.scraped_data, \
           analysis = EXCLUDED.analysis, \
           category = EXCLUDED.category, \
           updated_at = NOW() \
         RETURNING id, insta_username, scraped_data, analysis, category, created_at, updated_at",
    )
    .bind(record.insta_username)
    .bind(scraped_data)
    .bind(record.analysis)
    .bind(record.category)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch the record for a handle, or `None` if it was never analyzed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_profile_analysis(
    pool: &PgPool,
    insta_username: &str,
) -> Result<Option<ProfileAnalysisRow>, DbError> {
    let row = sqlx::query_as::<_, ProfileAnalysisRow>(&format!(
        "{SELECT_COLUMNS} WHERE insta_username = $1"
    ))
    .bind(insta_username)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List the most recently created records, optionally filtered by category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_profile_analyses(
    pool: &PgPool,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<ProfileAnalysisRow>, DbError> {
    let rows = match category {
        Some(category) => {
            sqlx::query_as::<_, ProfileAnalysisRow>(&format!(
                "{SELECT_COLUMNS} WHERE category = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
            ))
            .bind(category)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ProfileAnalysisRow>(&format!(
                "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

/// Distinct non-blank categories across all records, sorted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let categories = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM profile_analyses \
         WHERE category IS NOT NULL AND btrim(category) <> '' \
         ORDER BY category",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}
