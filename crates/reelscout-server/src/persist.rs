//! Persistence of completed analyses.
//!
//! The first write happens inline. If it fails, the record is handed to a
//! background task that retries with exponential back-off and jitter; the
//! caller's response never waits on those retries.

use std::time::Duration;

use reelscout_core::ScrapeResult;
use reelscout_db::{DbError, NewProfileAnalysis};
use serde_json::Value;
use sqlx::PgPool;

/// Back-off schedule for deferred writes.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`, then scaled by a random factor in `[0.75, 1.25)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let computed = self.base_delay.saturating_mul(1u32 << exponent);
        let capped = computed.min(self.max_delay);
        capped.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
    }
}

/// An analysis waiting to be written.
#[derive(Debug, Clone)]
pub struct PendingAnalysis {
    pub insta_username: String,
    pub scraped_data: ScrapeResult,
    pub analysis: Value,
    pub category: Option<String>,
}

impl PendingAnalysis {
    async fn write(&self, pool: &PgPool) -> Result<(), DbError> {
        reelscout_db::upsert_profile_analysis(
            pool,
            &NewProfileAnalysis {
                insta_username: &self.insta_username,
                scraped_data: &self.scraped_data,
                analysis: &self.analysis,
                category: self.category.as_deref(),
            },
        )
        .await?;
        Ok(())
    }
}

/// Write `pending` now, or schedule background retries if that fails.
///
/// Returns `true` when the inline write succeeded.
pub async fn persist_or_defer(pool: &PgPool, pending: PendingAnalysis, policy: RetryPolicy) -> bool {
    match pending.write(pool).await {
        Ok(()) => {
            tracing::info!(username = %pending.insta_username, "analysis persisted");
            true
        }
        Err(e) => {
            tracing::warn!(
                username = %pending.insta_username,
                error = %e,
                "persisting analysis failed; retrying in background"
            );
            let pool = pool.clone();
            tokio::spawn(async move {
                retry_write(&pool, &pending, policy).await;
            });
            false
        }
    }
}

async fn retry_write(pool: &PgPool, pending: &PendingAnalysis, policy: RetryPolicy) {
    for attempt in 1..=policy.max_retries {
        let delay = policy.delay_for(attempt);
        tokio::time::sleep(delay).await;

        match pending.write(pool).await {
            Ok(()) => {
                tracing::info!(
                    username = %pending.insta_username,
                    attempt,
                    "analysis persisted after retry"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(
                    username = %pending.insta_username,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "persist retry failed"
                );
            }
        }
    }

    tracing::error!(
        username = %pending.insta_username,
        "giving up on persisting analysis"
    );
}
