//! Reading posts from followed feeds.

use uuid::Uuid;

use super::store::FeedStore;
use super::types::{FeedPost, DEFAULT_BROWSE_LIMIT};
use crate::{GatorError, Result};

/// Parse the optional browse limit argument.
///
/// Absent means [`DEFAULT_BROWSE_LIMIT`]; anything present must be a
/// positive integer.
pub fn parse_limit(arg: Option<&str>) -> Result<i64> {
    let Some(raw) = arg else {
        return Ok(DEFAULT_BROWSE_LIMIT);
    };

    match raw.trim().parse::<i64>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(GatorError::Validation(format!(
            "limit must be a positive integer, got {:?}",
            raw
        ))),
    }
}

/// Newest posts from the feeds `user_id` follows, at most `limit`.
pub async fn browse<S: FeedStore>(store: &S, user_id: Uuid, limit: i64) -> Result<Vec<FeedPost>> {
    let feed_ids = store.feeds_followed_by_user(user_id).await?;
    if feed_ids.is_empty() {
        return Ok(Vec::new());
    }
    store.posts_for_feeds(&feed_ids, limit).await
}
