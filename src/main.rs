//! Worky command line
//!
//! Opens one task database and runs a single command against it.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use worky::cli::Cli;
use worky::cli::commands::{self, CommandContext};
use worky::config::Config;
use worky::db::{Storage, is_valid_db_path};
use worky::logging::{self, LogTarget};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::load_or_default(cli.config.as_deref())?;

    // Override from CLI arguments
    if let Some(db_path) = &cli.database {
        config.storage.db_path = db_path.clone();
    }
    if let Some(format) = cli.format {
        config.display.format = format;
    }

    // Invalid names are rejected by Storage::open; don't create directories for them.
    if is_valid_db_path(&config.storage.db_path.to_string_lossy()) {
        config.ensure_db_dir()?;
    }
    debug!(db_path = %config.storage.db_path.display(), "Using database");

    let storage = Storage::open(&config.storage.db_path)
        .with_context(|| format!("opening {}", config.storage.db_path.display()))?;

    let ctx = CommandContext {
        format: config.display.format,
        default_due_days: config.display.default_due_days,
    };
    let output = commands::run(&storage, &cli.command, ctx)?;
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
