//! Test helpers for integration tests.
//!
//! Provides a local feed server, a command context wired to an in-memory
//! database, and a capturable output buffer.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use gator::cli::{Cli, Command, CommandContext};
use gator::config::{Config, RssConfig};
use gator::{Database, Session, SystemClock};

/// A small but valid RSS 2.0 document with two items.
pub const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Lane's Blog</title>
    <link>https://blog.example.com</link>
    <description>Posts about things</description>
    <item>
      <title>Hello World</title>
      <link>https://blog.example.com/hello</link>
      <description>&lt;b&gt;Hi&lt;/b&gt; &amp;amp; bye</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>https://blog.example.com/second</link>
      <pubDate>Tue, 03 Jan 2006 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

/// Spawn a local HTTP server serving feeds:
///
/// - `/feed.xml`: [`SAMPLE_FEED`]
/// - `/broken.xml`: not RSS
/// - `/missing.xml`: 404
pub async fn spawn_feed_server() -> SocketAddr {
    let router = Router::new()
        .route("/feed.xml", get(|| async { SAMPLE_FEED }))
        .route(
            "/broken.xml",
            get(|| async { "<html><body>not a feed</body></html>" }),
        )
        .route(
            "/missing.xml",
            get(|| async { (StatusCode::NOT_FOUND, "not found") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind feed server");
    let addr = listener.local_addr().expect("feed server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("feed server");
    });
    addr
}

/// RSS settings that allow fetching from the local test server.
pub fn local_rss_config() -> RssConfig {
    RssConfig {
        block_private_hosts: false,
        ..RssConfig::default()
    }
}

/// Output sink that can be read back after a command ran.
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    /// Drain everything written so far.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.lock().unwrap());
        String::from_utf8(bytes).unwrap()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A command context over an in-memory database and a temporary session file.
pub struct TestEnv {
    pub ctx: CommandContext,
    pub out: SharedOutput,
    _dir: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let session =
            Session::load(dir.path().join(".gatorconfig.json")).expect("empty session");
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");

        let config = Config {
            rss: local_rss_config(),
            ..Config::default()
        };

        let out = SharedOutput::default();
        let ctx = CommandContext {
            db,
            config,
            session,
            clock: Box::new(SystemClock),
            out: Box::new(out.clone()),
            cancel: CancellationToken::new(),
        };

        Self {
            ctx,
            out,
            _dir: dir,
        }
    }

    /// Run a command line (without the program name) and return its output.
    pub async fn run(&mut self, args: &[&str]) -> gator::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("gator").chain(args.iter().copied()))
            .expect("valid command line");
        cli.subcmd.execute(&mut self.ctx).await?;
        Ok(self.out.take())
    }
}
