//! Storage seam for the polling pipeline and browse query.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::repository::{FeedFollowRepository, FeedRepository, PostRepository};
use super::types::{Feed, FeedPost, NewPost, Post};
use crate::db::Database;
use crate::{GatorError, Result};

/// Durable storage for feeds and posts as seen by the ingestion pipeline and
/// the browse query.
///
/// Implementations must enforce the global uniqueness of post URLs and
/// report a collision as [`GatorError::DuplicateUrl`]; callers never check
/// before inserting.
#[allow(async_fn_in_trait)]
pub trait FeedStore {
    /// The feed with the oldest `last_fetched_at`, never-fetched feeds first,
    /// ties broken by id. Fails with `NotFound` when there are no feeds.
    async fn next_feed_to_fetch(&self) -> Result<Feed>;

    /// Stamp a feed as polled.
    async fn mark_feed_fetched(
        &self,
        feed_id: Uuid,
        fetched_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Insert a post.
    async fn create_post(&self, post: &NewPost) -> Result<Post>;

    /// IDs of the feeds a user follows.
    async fn feeds_followed_by_user(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    /// Newest posts among `feed_ids`, at most `limit`.
    async fn posts_for_feeds(&self, feed_ids: &[Uuid], limit: i64) -> Result<Vec<FeedPost>>;
}

impl FeedStore for Database {
    async fn next_feed_to_fetch(&self) -> Result<Feed> {
        FeedRepository::new(self.pool())
            .next_to_fetch()
            .await?
            .ok_or_else(|| GatorError::NotFound("feed".to_string()))
    }

    async fn mark_feed_fetched(
        &self,
        feed_id: Uuid,
        fetched_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        FeedRepository::new(self.pool())
            .mark_fetched(feed_id, fetched_at, updated_at)
            .await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        PostRepository::new(self.pool()).create(post).await
    }

    async fn feeds_followed_by_user(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        FeedFollowRepository::new(self.pool())
            .feed_ids_for_user(user_id)
            .await
    }

    async fn posts_for_feeds(&self, feed_ids: &[Uuid], limit: i64) -> Result<Vec<FeedPost>> {
        PostRepository::new(self.pool())
            .list_for_feeds(feed_ids, limit)
            .await
    }
}

impl<S: FeedStore + ?Sized> FeedStore for &S {
    async fn next_feed_to_fetch(&self) -> Result<Feed> {
        (**self).next_feed_to_fetch().await
    }

    async fn mark_feed_fetched(
        &self,
        feed_id: Uuid,
        fetched_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        (**self)
            .mark_feed_fetched(feed_id, fetched_at, updated_at)
            .await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        (**self).create_post(post).await
    }

    async fn feeds_followed_by_user(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        (**self).feeds_followed_by_user(user_id).await
    }

    async fn posts_for_feeds(&self, feed_ids: &[Uuid], limit: i64) -> Result<Vec<FeedPost>> {
        (**self).posts_for_feeds(feed_ids, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::rss::types::NewFeed;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_next_feed_to_fetch_no_feeds() {
        let db = Database::open_in_memory().await.unwrap();
        let result = db.next_feed_to_fetch().await;
        assert!(matches!(result, Err(GatorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_selection_order_rotates() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("kahya", at(0)))
            .await
            .unwrap();
        let feeds = FeedRepository::new(db.pool());

        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let (feed, _) = feeds
                .create_with_follow(&NewFeed::new(
                    name,
                    format!("https://example.com/{name}"),
                    user.id,
                    at(0),
                ))
                .await
                .unwrap();
            ids.push(feed.id);
        }
        // A never fetched, B at t1, C at t2.
        db.mark_feed_fetched(ids[1], at(1), at(1)).await.unwrap();
        db.mark_feed_fetched(ids[2], at(2), at(2)).await.unwrap();

        let mut order = Vec::new();
        for minute in 10..13 {
            let feed = db.next_feed_to_fetch().await.unwrap();
            db.mark_feed_fetched(feed.id, at(minute), at(minute))
                .await
                .unwrap();
            order.push(feed.id);
        }
        assert_eq!(order, ids);
    }

    #[tokio::test]
    async fn test_create_post_is_idempotent_per_url() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("kahya", at(0)))
            .await
            .unwrap();
        let (feed, _) = FeedRepository::new(db.pool())
            .create_with_follow(&NewFeed::new("f", "https://example.com/f", user.id, at(0)))
            .await
            .unwrap();

        let post = NewPost::new(feed.id, "t", "https://example.com/x", at(1), at(1));
        db.create_post(&post).await.unwrap();
        let second = db.create_post(&post).await;

        assert!(matches!(second, Err(GatorError::DuplicateUrl(_))));
        let posts = db.posts_for_feeds(&[feed.id], 10).await.unwrap();
        assert_eq!(posts.len(), 1);
    }
}
