//! Feed, follow and post repositories for gator.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::types::{
    Feed, FeedFollow, FeedFollowView, FeedPost, FeedWithCreator, NewFeed, NewPost, Post,
};
use crate::datetime::{parse_db_timestamp, to_db_timestamp};
use crate::{GatorError, Result};

/// Row type for a feed from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: Uuid,
    name: String,
    url: String,
    user_id: Uuid,
    created_at: String,
    updated_at: String,
    last_fetched_at: Option<String>,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_db_timestamp(&s)),
        }
    }
}

/// Row type for a feed joined with its creator's name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedWithCreatorRow {
    id: Uuid,
    name: String,
    url: String,
    user_id: Uuid,
    created_at: String,
    updated_at: String,
    last_fetched_at: Option<String>,
    creator_name: String,
}

impl From<FeedWithCreatorRow> for FeedWithCreator {
    fn from(row: FeedWithCreatorRow) -> Self {
        let feed = Feed::from(FeedRow {
            id: row.id,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_fetched_at: row.last_fetched_at,
        });
        FeedWithCreator {
            feed,
            creator_name: row.creator_name,
        }
    }
}

/// Row type for a follow joined with feed and user names.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedFollowViewRow {
    id: Uuid,
    user_id: Uuid,
    feed_id: Uuid,
    created_at: String,
    updated_at: String,
    feed_name: String,
    user_name: String,
}

impl From<FeedFollowViewRow> for FeedFollowView {
    fn from(row: FeedFollowViewRow) -> Self {
        FeedFollowView {
            follow: FeedFollow {
                id: row.id,
                user_id: row.user_id,
                feed_id: row.feed_id,
                created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
                updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            },
            feed_name: row.feed_name,
            user_name: row.user_name,
        }
    }
}

/// Row type for a post from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    feed_id: Uuid,
    title: String,
    url: String,
    description: Option<String>,
    published_at: String,
    created_at: String,
    updated_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            feed_id: row.feed_id,
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: parse_db_timestamp(&row.published_at).unwrap_or_else(Utc::now),
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a post joined with its feed's name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedPostRow {
    id: Uuid,
    feed_id: Uuid,
    title: String,
    url: String,
    description: Option<String>,
    published_at: String,
    created_at: String,
    updated_at: String,
    feed_name: String,
}

impl From<FeedPostRow> for FeedPost {
    fn from(row: FeedPostRow) -> Self {
        let post = Post::from(PostRow {
            id: row.id,
            feed_id: row.feed_id,
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
        FeedPost {
            post,
            feed_name: row.feed_name,
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a feed and make its creator follow it.
    ///
    /// Both rows are written in one transaction: either the feed exists with
    /// the creator's follow, or neither does.
    pub async fn create_with_follow(&self, feed: &NewFeed) -> Result<(Feed, FeedFollow)> {
        let feed_id = Uuid::new_v4();
        let follow_id = Uuid::new_v4();
        let now = to_db_timestamp(&feed.created_at);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO feeds (id, name, url, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(feed_id)
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.user_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GatorError::Validation(format!("feed {} already exists", feed.url))
            } else {
                GatorError::Database(e.to_string())
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(follow_id)
        .bind(feed.user_id)
        .bind(feed_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        tx.commit().await?;

        let created = Feed {
            id: feed_id,
            name: feed.name.clone(),
            url: feed.url.clone(),
            user_id: feed.user_id,
            created_at: feed.created_at,
            updated_at: feed.created_at,
            last_fetched_at: None,
        };
        let follow = FeedFollow {
            id: follow_id,
            user_id: feed.user_id,
            feed_id,
            created_at: feed.created_at,
            updated_at: feed.created_at,
        };
        Ok((created, follow))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// List every feed with the name of the user who added it.
    pub async fn list_with_creator(&self) -> Result<Vec<FeedWithCreator>> {
        let rows = sqlx::query_as::<_, FeedWithCreatorRow>(
            r#"
            SELECT f.id, f.name, f.url, f.user_id, f.created_at, f.updated_at,
                   f.last_fetched_at, u.name AS creator_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.created_at ASC, f.name ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedWithCreator::from).collect())
    }

    /// The feed polled least recently. Never-polled feeds come first.
    pub async fn next_to_fetch(&self) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Record a poll of the feed.
    ///
    /// `last_fetched_at` never moves backwards: an older `fetched_at` leaves
    /// the stored value in place.
    pub async fn mark_fetched(
        &self,
        id: Uuid,
        fetched_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE feeds
            SET last_fetched_at = CASE
                    WHEN last_fetched_at IS NULL OR last_fetched_at < $2 THEN $2
                    ELSE last_fetched_at
                END,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(to_db_timestamp(&fetched_at))
        .bind(to_db_timestamp(&updated_at))
        .execute(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(GatorError::NotFound(format!("feed {id}")));
        }
        Ok(())
    }
}

/// Repository for follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Make a user follow a feed.
    ///
    /// Returns `Validation` when the user already follows it.
    pub async fn create(
        &self,
        user_id: Uuid,
        feed_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FeedFollowView> {
        let id = Uuid::new_v4();
        let now = to_db_timestamp(&now);

        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(feed_id)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GatorError::Validation("already following this feed".to_string())
            } else {
                GatorError::Database(e.to_string())
            }
        })?;

        self.get_view(id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed follow".to_string()))
    }

    async fn get_view(&self, id: Uuid) -> Result<Option<FeedFollowView>> {
        let row = sqlx::query_as::<_, FeedFollowViewRow>(
            r#"
            SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at, ff.updated_at,
                   f.name AS feed_name, u.name AS user_name
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            JOIN users u ON u.id = ff.user_id
            WHERE ff.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(FeedFollowView::from))
    }

    /// List the follows of a user, oldest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FeedFollowView>> {
        let rows = sqlx::query_as::<_, FeedFollowViewRow>(
            r#"
            SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at, ff.updated_at,
                   f.name AS feed_name, u.name AS user_name
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            JOIN users u ON u.id = ff.user_id
            WHERE ff.user_id = $1
            ORDER BY ff.created_at ASC, f.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedFollowView::from).collect())
    }

    /// IDs of the feeds a user follows.
    pub async fn feed_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT feed_id FROM feed_follows
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(ids)
    }

    /// Remove a follow. Returns whether a row was deleted.
    pub async fn delete(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = $1 AND feed_id = $2")
            .bind(user_id)
            .bind(feed_id)
            .execute(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a post.
    ///
    /// The unique constraint on `url` is the only duplicate check; a
    /// collision is reported as `DuplicateUrl`.
    pub async fn create(&self, post: &NewPost) -> Result<Post> {
        let id = Uuid::new_v4();
        let created_at = to_db_timestamp(&post.created_at);

        sqlx::query(
            r#"
            INSERT INTO posts (id, feed_id, title, url, description, published_at,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(id)
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(to_db_timestamp(&post.published_at))
        .bind(&created_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GatorError::DuplicateUrl(post.url.clone())
            } else {
                GatorError::Database(e.to_string())
            }
        })?;

        Ok(Post {
            id,
            feed_id: post.feed_id,
            title: post.title.clone(),
            url: post.url.clone(),
            description: post.description.clone(),
            published_at: post.published_at,
            created_at: post.created_at,
            updated_at: post.created_at,
        })
    }

    /// Newest posts across the given feeds, at most `limit`.
    pub async fn list_for_feeds(&self, feed_ids: &[Uuid], limit: i64) -> Result<Vec<FeedPost>> {
        if feed_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT p.id, p.feed_id, p.title, p.url, p.description, p.published_at,
                   p.created_at, p.updated_at, f.name AS feed_name
            FROM posts p
            JOIN feeds f ON f.id = p.feed_id
            WHERE p.feed_id IN (
            "#,
        );
        let mut separated = query.separated(", ");
        for id in feed_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY p.published_at DESC, p.url ASC LIMIT ");
        query.push_bind(limit);

        let rows = query
            .build_query_as::<FeedPostRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedPost::from).collect())
    }

    /// Number of posts stored for a feed.
    pub async fn count_for_feed(&self, feed_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = $1")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(count)
    }
}
