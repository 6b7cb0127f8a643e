use std::time::Duration;

use rand::Rng;
use reelscout_core::PostRecord;

use crate::browser::BrowserPage;
use crate::error::ScraperError;
use crate::extract;
use crate::navigator::Navigator;

/// Visit each post URL in order and extract one record per URL.
///
/// Visits are sequential with a jittered pause between them. A post that
/// fails to load aborts the whole collection.
///
/// # Errors
///
/// Returns the first navigation error encountered.
pub async fn collect_posts<P: BrowserPage>(
    navigator: &Navigator<'_, P>,
    urls: &[String],
    pacing: Duration,
) -> Result<Vec<PostRecord>, ScraperError> {
    let mut posts = Vec::with_capacity(urls.len());

    for (index, url) in urls.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(jittered(pacing)).await;
        }
        let snapshot = navigator.open_post(url).await?;
        let post = extract::extract_post(&snapshot.html, url);
        tracing::debug!(
            %url,
            comments = post.comments.len(),
            like_count = %post.like_count,
            "extracted post"
        );
        posts.push(post);
    }

    Ok(posts)
}

/// A delay drawn uniformly from `[base, 2 * base]`.
pub(crate) fn jittered(base: Duration) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let factor = rand::rng().random_range(1.0..=2.0);
    base.mul_f64(factor)
}
