use std::io::Write;

use clap::Parser;

use super::{Command, CommandContext};
use crate::rss::fetcher::RssFetcher;
use crate::rss::ingest::IngestPipeline;
use crate::rss::updater::{parse_interval, PollScheduler};
use crate::Result;

/// Poll feeds forever, one feed per interval
#[derive(Parser, Debug)]
pub struct Aggregate {
    /// Time between requests, e.g. 30s, 1m, 1h 30m
    time_between_reqs: String,
}

impl Command for Aggregate {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let every = parse_interval(&self.time_between_reqs)?;
        let fetcher = RssFetcher::new(&ctx.config.rss)?;

        writeln!(
            ctx.out,
            "Collecting feeds every {}",
            humantime::format_duration(every)
        )?;
        ctx.out.flush()?;

        let pipeline = IngestPipeline::new(&ctx.db, fetcher, &*ctx.clock);
        PollScheduler::new(pipeline, every)
            .run(ctx.cancel.clone())
            .await;
        Ok(())
    }
}
