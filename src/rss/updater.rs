//! Feed polling loop for gator.
//!
//! This module drives the ingestion pipeline at a fixed interval.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::ingest::PollCycle;
use crate::{GatorError, Result};

/// Parse an interval such as `1m`, `30s` or `1h 30m`.
///
/// The interval must be longer than zero.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let duration = humantime::parse_duration(s.trim())
        .map_err(|e| GatorError::Validation(format!("invalid duration {:?}: {}", s, e)))?;

    if duration.is_zero() {
        return Err(GatorError::Validation(
            "duration must be greater than zero".to_string(),
        ));
    }
    Ok(duration)
}

/// Runs one poll cycle per tick.
///
/// Cycles never overlap: a slow cycle delays the next one and ticks missed
/// meanwhile are dropped rather than replayed.
pub struct PollScheduler<P> {
    cycle: P,
    every: Duration,
}

impl<P: PollCycle> PollScheduler<P> {
    /// Create a scheduler running `cycle` every `every`.
    pub fn new(cycle: P, every: Duration) -> Self {
        Self { cycle, every }
    }

    /// Run until `cancel` fires. The first cycle starts immediately.
    ///
    /// Cycle failures are logged and do not stop the loop.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "Collecting feeds every {}",
            humantime::format_duration(self.every)
        );

        let mut timer = interval(self.every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            match self.cycle.run_cycle(&cancel).await {
                Ok(_) => {}
                Err(GatorError::NoFeedsAvailable) => warn!("No feeds to fetch"),
                Err(GatorError::Fetch(e)) => warn!("Failed to fetch feed: {}", e),
                Err(e) => error!("Poll cycle failed: {}", e),
            }
        }

        info!("Feed collection stopped");
    }
}
