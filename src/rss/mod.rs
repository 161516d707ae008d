//! Feed aggregation for gator.
//!
//! This module provides feed storage, polling, and reading of posts from
//! followed feeds.

pub mod browse;
pub mod fetcher;
pub mod html;
pub mod ingest;
pub mod normalize;
pub mod render;
pub mod repository;
pub mod store;
pub mod types;
pub mod updater;

pub use browse::{browse, parse_limit};
pub use fetcher::{parse_feed, validate_url, FeedSource, RssFetcher};
pub use ingest::{CycleReport, IngestPipeline, PollCycle};
pub use normalize::{normalize_item, parse_pub_date};
pub use render::render_posts;
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository};
pub use store::FeedStore;
pub use types::{
    Feed, FeedFollow, FeedFollowView, FeedPost, FeedWithCreator, NewFeed, NewPost, ParsedFeed,
    ParsedItem, Post, DEFAULT_BROWSE_LIMIT,
};
pub use updater::{parse_interval, PollScheduler};
