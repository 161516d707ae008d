//! RSS types for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default number of posts shown by browse.
pub const DEFAULT_BROWSE_LIMIT: i64 = 8;

/// A subscribable feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    /// Feed ID.
    pub id: Uuid,
    /// Display name chosen by the creator.
    pub name: String,
    /// Feed URL (unique).
    pub url: String,
    /// User who added the feed.
    pub user_id: Uuid,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last time the feed was polled. `None` means never.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// User adding the feed.
    pub user_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl NewFeed {
    /// Create a new feed.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        user_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
            created_at,
        }
    }
}

/// A feed together with the name of the user who added it.
#[derive(Debug, Clone)]
pub struct FeedWithCreator {
    /// The feed.
    pub feed: Feed,
    /// Creator's user name.
    pub creator_name: String,
}

/// A user following a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFollow {
    /// Follow ID.
    pub id: Uuid,
    /// Following user.
    pub user_id: Uuid,
    /// Followed feed.
    pub feed_id: Uuid,
    /// When the follow was created.
    pub created_at: DateTime<Utc>,
    /// When the follow was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A follow joined with the names of its user and feed.
#[derive(Debug, Clone)]
pub struct FeedFollowView {
    /// The follow record.
    pub follow: FeedFollow,
    /// Name of the followed feed.
    pub feed_name: String,
    /// Name of the following user.
    pub user_name: String,
}

/// A stored post.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Post ID.
    pub id: Uuid,
    /// Feed the post came from.
    pub feed_id: Uuid,
    /// Post title.
    pub title: String,
    /// Post URL (globally unique).
    pub url: String,
    /// Raw description, `None` when the feed had none.
    pub description: Option<String>,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// When the post was first stored.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New post for creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    /// Feed the post belongs to.
    pub feed_id: Uuid,
    /// Post title.
    pub title: String,
    /// Post URL.
    pub url: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// Ingestion time.
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    /// Create a new post without a description.
    pub fn new(
        feed_id: Uuid,
        title: impl Into<String>,
        url: impl Into<String>,
        published_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            feed_id,
            title: title.into(),
            url: url.into(),
            description: None,
            published_at,
            created_at,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A post joined with the name of its feed.
#[derive(Debug, Clone)]
pub struct FeedPost {
    /// The post.
    pub post: Post,
    /// Name of the feed it belongs to.
    pub feed_name: String,
}

/// Parsed feed data (from RSS parsing).
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Channel title.
    pub title: String,
    /// Channel link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Items in document order.
    pub items: Vec<ParsedItem>,
}

/// Parsed item data (from RSS parsing).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedItem {
    /// Item title.
    pub title: String,
    /// Item link.
    pub link: Option<String>,
    /// Item description.
    pub description: Option<String>,
    /// Raw `pubDate` text, undecoded.
    pub pub_date: Option<String>,
}
