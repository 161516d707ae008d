//! gator - a feed aggregator
//!
//! Polls RSS feeds into a SQLite database and lets users browse the posts of
//! the feeds they follow.

pub mod cli;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod rss;
pub mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{FetchError, GatorError, Result};
pub use session::Session;
