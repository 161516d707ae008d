use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use gator::cli::{Cli, Command, CommandContext, SubCommand};
use gator::{Config, Database, GatorError, Result, Session, SystemClock};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                eprint!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_user_error() {
                error!("Command failed: {e}");
            }
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load configuration, falling back to defaults when the file is missing.
fn load_config() -> Config {
    let path = Config::default_path();
    match Config::load(&path) {
        Ok(config) => config,
        Err(GatorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            eprintln!("Using default configuration.");
            Config::default()
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config();

    // Initialize logging
    if let Err(e) = gator::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        gator::logging::init_console_only(&config.logging.level);
    }

    let session = Session::load(config.session.resolved_path())?;
    debug!("Session file: {}", session.path().display());
    if let Some(url) = session.db_url() {
        debug!("Using database URL from session file");
        config.database.url = url.to_string();
    }
    config.apply_env_overrides();
    config.validate()?;

    let db = Database::open(&config.database.url).await?;

    let cancel = CancellationToken::new();
    if matches!(cli.subcmd, SubCommand::Aggregate(_)) {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, shutting down");
                token.cancel();
            }
        });
    }

    let mut ctx = CommandContext {
        db,
        config,
        session,
        clock: Box::new(SystemClock),
        out: Box::new(std::io::stdout()),
        cancel,
    };
    cli.subcmd.execute(&mut ctx).await
}
