//! One polling cycle: pick a feed, fetch it, store its new posts.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fetcher::FeedSource;
use super::normalize::normalize_item;
use super::store::FeedStore;
use super::types::Feed;
use crate::clock::Clock;
use crate::{GatorError, Result};

/// Outcome of a successful cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// The feed that was polled.
    pub feed: Feed,
    /// Posts stored for the first time.
    pub inserted: usize,
    /// Items whose URL was already stored.
    pub duplicates: usize,
    /// Items the store refused for another reason.
    pub failed: usize,
    /// Items without a link.
    pub skipped: usize,
}

/// A unit of work the scheduler runs once per tick.
#[allow(async_fn_in_trait)]
pub trait PollCycle {
    /// Run one cycle.
    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport>;
}

/// Ingestion pipeline over a store, a feed source and a clock.
pub struct IngestPipeline<S, F, C> {
    store: S,
    source: F,
    clock: C,
}

impl<S, F, C> IngestPipeline<S, F, C>
where
    S: FeedStore,
    F: FeedSource,
    C: Clock,
{
    /// Create a new pipeline.
    pub fn new(store: S, source: F, clock: C) -> Self {
        Self {
            store,
            source,
            clock,
        }
    }

    /// Poll the least recently fetched feed.
    ///
    /// The feed is stamped as fetched before the request goes out, so a feed
    /// whose fetch fails keeps its new `last_fetched_at` and waits for its
    /// next turn in the rotation.
    pub async fn scrape_next(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let feed = match self.store.next_feed_to_fetch().await {
            Ok(feed) => feed,
            Err(GatorError::NotFound(_)) => return Err(GatorError::NoFeedsAvailable),
            Err(e) => return Err(e),
        };

        let now = self.clock.now();
        self.store.mark_feed_fetched(feed.id, now, now).await?;

        debug!("Fetching feed {} ({})", feed.name, feed.url);
        let parsed = self.source.fetch(&feed.url, cancel).await?;

        let mut report = CycleReport {
            feed,
            inserted: 0,
            duplicates: 0,
            failed: 0,
            skipped: 0,
        };

        for item in &parsed.items {
            let Some(post) = normalize_item(report.feed.id, item, now) else {
                debug!("Skipping item without link: {:?}", item.title);
                report.skipped += 1;
                continue;
            };

            match self.store.create_post(&post).await {
                Ok(_) => report.inserted += 1,
                Err(GatorError::DuplicateUrl(_)) => report.duplicates += 1,
                Err(e) => {
                    warn!("Failed to store post {}: {}", post.url, e);
                    report.failed += 1;
                }
            }
        }

        if report.inserted > 0 {
            info!(
                "Feed {} updated: {} new post(s)",
                report.feed.name, report.inserted
            );
        } else {
            debug!("Feed {} updated: no new posts", report.feed.name);
        }

        Ok(report)
    }
}

impl<S, F, C> PollCycle for IngestPipeline<S, F, C>
where
    S: FeedStore,
    F: FeedSource,
    C: Clock,
{
    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        self.scrape_next(cancel).await
    }
}
