//! Text menu front end for the social network store.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Start file logging, open (and optionally reset) the database.
//! - Hand stdin/stdout to the menu loop.

use anyhow::{anyhow, ensure, Context, Result};
use clap::Parser;
use socialnet_core::db::schema::drop_tables;
use socialnet_core::{default_log_level, init_logging, open_db, ImportOptions};
use std::io;
use std::path::PathBuf;

mod menu;

#[derive(Parser, Debug)]
#[command(
    name = "socialnet",
    version,
    about = "Manage user accounts and status messages in a local SQLite store"
)]
struct Cli {
    /// SQLite database file, created on first use
    #[arg(long, env = "SOCIALNET_DB", default_value = "socialnetwork.db")]
    db: PathBuf,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "SOCIALNET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rotated log files [default: ./logs]
    #[arg(long, env = "SOCIALNET_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Field delimiter for import files
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Drop all tables before starting
    #[arg(long)]
    reset: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = absolute_log_dir(cli.log_dir)?;
    let log_dir = log_dir
        .to_str()
        .context("log directory must be valid UTF-8")?;
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, log_dir)
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")?;

    ensure!(
        cli.delimiter.is_ascii(),
        "delimiter must be a single ASCII character, got `{}`",
        cli.delimiter
    );
    let options = ImportOptions {
        delimiter: cli.delimiter as u8,
    };

    println!("\nVerifying database...");
    let mut conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    if cli.reset {
        drop_tables(&mut conn).context("failed to drop tables")?;
        drop(conn);
        conn = open_db(&cli.db)
            .with_context(|| format!("failed to reopen database `{}`", cli.db.display()))?;
    }
    println!("Database verified!");

    menu::run(&mut conn, options, io::stdin().lock(), io::stdout().lock())
        .context("menu terminated with an I/O error")?;
    Ok(())
}

fn absolute_log_dir(configured: Option<PathBuf>) -> Result<PathBuf> {
    let dir = configured.unwrap_or_else(|| PathBuf::from("logs"));
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(dir))
}
