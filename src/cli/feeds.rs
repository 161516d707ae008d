use std::io::Write;

use clap::Parser;
use tracing::info;

use super::{Command, CommandContext};
use crate::rss::browse::{browse, parse_limit};
use crate::rss::fetcher::validate_url;
use crate::rss::render::render_posts;
use crate::rss::repository::{FeedFollowRepository, FeedRepository};
use crate::rss::types::NewFeed;
use crate::{GatorError, Result};

/// Add a feed and follow it
#[derive(Parser, Debug)]
pub struct AddFeed {
    name: String,
    url: String,
}

impl Command for AddFeed {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let user = ctx.active_user().await?;
        validate_url(&self.url, ctx.config.rss.block_private_hosts)
            .map_err(|e| GatorError::Validation(e.to_string()))?;

        let (feed, _follow) = FeedRepository::new(ctx.db.pool())
            .create_with_follow(&NewFeed::new(
                self.name,
                self.url,
                user.id,
                ctx.clock.now(),
            ))
            .await?;
        info!("User {} added feed {} ({})", user.name, feed.name, feed.url);

        writeln!(ctx.out, "Added feed {} ({})", feed.name, feed.url)?;
        writeln!(ctx.out, "{} is now following {}", user.name, feed.name)?;
        Ok(())
    }
}

/// List all feeds
#[derive(Parser, Debug)]
pub struct ListFeeds;

impl Command for ListFeeds {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let feeds = FeedRepository::new(ctx.db.pool())
            .list_with_creator()
            .await?;

        for entry in feeds {
            writeln!(
                ctx.out,
                "* {} {} (added by {})",
                entry.feed.name, entry.feed.url, entry.creator_name
            )?;
        }
        Ok(())
    }
}

/// Follow an existing feed by URL
#[derive(Parser, Debug)]
pub struct Follow {
    url: String,
}

impl Command for Follow {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let user = ctx.active_user().await?;
        let feed = FeedRepository::new(ctx.db.pool())
            .get_by_url(&self.url)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed {}", self.url)))?;

        let follow = FeedFollowRepository::new(ctx.db.pool())
            .create(user.id, feed.id, ctx.clock.now())
            .await?;

        writeln!(
            ctx.out,
            "{} is now following {}",
            follow.user_name, follow.feed_name
        )?;
        Ok(())
    }
}

/// List the feeds you follow
#[derive(Parser, Debug)]
pub struct ListFollowing;

impl Command for ListFollowing {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let user = ctx.active_user().await?;
        let follows = FeedFollowRepository::new(ctx.db.pool())
            .list_for_user(user.id)
            .await?;

        writeln!(ctx.out, "Feeds followed by {}:", user.name)?;
        for follow in follows {
            writeln!(ctx.out, "* {}", follow.feed_name)?;
        }
        Ok(())
    }
}

/// Stop following a feed
#[derive(Parser, Debug)]
pub struct Unfollow {
    url: String,
}

impl Command for Unfollow {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let user = ctx.active_user().await?;
        let feed = FeedRepository::new(ctx.db.pool())
            .get_by_url(&self.url)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed {}", self.url)))?;

        let removed = FeedFollowRepository::new(ctx.db.pool())
            .delete(user.id, feed.id)
            .await?;
        if !removed {
            return Err(GatorError::NotFound(format!(
                "follow of {} by {}",
                feed.url, user.name
            )));
        }

        writeln!(ctx.out, "Unfollowed {}", feed.name)?;
        Ok(())
    }
}

/// Show recent posts from the feeds you follow
#[derive(Parser, Debug)]
pub struct Browse {
    /// Maximum number of posts (default 8)
    #[arg(allow_hyphen_values = true)]
    limit: Option<String>,
}

impl Command for Browse {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let limit = parse_limit(self.limit.as_deref())?;
        let user = ctx.active_user().await?;

        let posts = browse(&ctx.db, user.id, limit).await?;
        render_posts(&mut *ctx.out, &posts, &ctx.config.display.timezone)
    }
}
