//! Database schema and migrations for gator.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
/// Timestamps are fixed-width RFC3339 UTC strings, ids are UUIDs.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          BLOB PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#,
    // v2: feeds
    r#"
CREATE TABLE feeds (
    id              BLOB PRIMARY KEY,
    name            TEXT NOT NULL,
    url             TEXT NOT NULL UNIQUE,
    user_id         BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    last_fetched_at TEXT
);

CREATE INDEX idx_feeds_user_id ON feeds(user_id);
CREATE INDEX idx_feeds_last_fetched_at ON feeds(last_fetched_at);
"#,
    // v3: feed follows
    r#"
CREATE TABLE feed_follows (
    id          BLOB PRIMARY KEY,
    user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE(user_id, feed_id)
);

CREATE INDEX idx_feed_follows_feed_id ON feed_follows(feed_id);
"#,
    // v4: posts
    r#"
CREATE TABLE posts (
    id              BLOB PRIMARY KEY,
    feed_id         BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    title           TEXT NOT NULL,
    url             TEXT NOT NULL UNIQUE,
    description     TEXT,
    published_at    TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX idx_posts_feed_published ON posts(feed_id, published_at);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_migrations_create_tables() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(migration.contains("CREATE TABLE"));
        }
    }

    #[test]
    fn test_posts_url_is_unique() {
        let posts = MIGRATIONS[3];
        assert!(posts.contains("CREATE TABLE posts"));
        assert!(posts.contains("url             TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_feed_follows_unique_pair() {
        let follows = MIGRATIONS[2];
        assert!(follows.contains("CREATE TABLE feed_follows"));
        assert!(follows.contains("UNIQUE(user_id, feed_id)"));
    }
}
