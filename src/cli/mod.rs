//! Command-line interface for gator.
//!
//! Every subcommand is a small struct parsed by clap that implements
//! [`Command`]. Commands receive a [`CommandContext`] holding everything they
//! may touch; nothing is global.

mod agg;
mod feeds;
mod users;

pub use agg::Aggregate;
pub use feeds::{AddFeed, Browse, Follow, ListFeeds, ListFollowing, Unfollow};
pub use users::{ListUsers, Login, Register, Reset};

use std::io::Write;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::Config;
use crate::db::{Database, User, UserRepository};
use crate::session::Session;
use crate::{GatorError, Result};

/// Feed aggregator.
#[derive(Parser, Debug)]
#[command(name = "gator", version)]
pub struct Cli {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    Login(Login),
    Register(Register),
    Reset(Reset),
    #[command(name = "users")]
    ListUsers(ListUsers),
    #[command(name = "agg")]
    Aggregate(Aggregate),
    #[command(name = "addfeed")]
    AddFeed(AddFeed),
    #[command(name = "feeds")]
    ListFeeds(ListFeeds),
    Follow(Follow),
    #[command(name = "following")]
    ListFollowing(ListFollowing),
    Unfollow(Unfollow),
    Browse(Browse),
}

/// Everything a command may use.
pub struct CommandContext {
    pub db: Database,
    pub config: Config,
    pub session: Session,
    pub clock: Box<dyn Clock>,
    pub out: Box<dyn Write>,
    /// Fires when the user asks the process to stop.
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// The logged-in user.
    ///
    /// Fails with `Validation` when nobody is logged in and `NotFound` when
    /// the session names a user that no longer exists.
    pub async fn active_user(&self) -> Result<User> {
        let name = self.session.current_user_name().ok_or_else(|| {
            GatorError::Validation("no user logged in, run `gator login <name>` first".to_string())
        })?;

        UserRepository::new(self.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {name}")))
    }
}

/// A runnable subcommand.
#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()>;
}

impl Command for SubCommand {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        match self {
            SubCommand::Login(cmd) => cmd.execute(ctx).await,
            SubCommand::Register(cmd) => cmd.execute(ctx).await,
            SubCommand::Reset(cmd) => cmd.execute(ctx).await,
            SubCommand::ListUsers(cmd) => cmd.execute(ctx).await,
            SubCommand::Aggregate(cmd) => cmd.execute(ctx).await,
            SubCommand::AddFeed(cmd) => cmd.execute(ctx).await,
            SubCommand::ListFeeds(cmd) => cmd.execute(ctx).await,
            SubCommand::Follow(cmd) => cmd.execute(ctx).await,
            SubCommand::ListFollowing(cmd) => cmd.execute(ctx).await,
            SubCommand::Unfollow(cmd) => cmd.execute(ctx).await,
            SubCommand::Browse(cmd) => cmd.execute(ctx).await,
        }
    }
}
