//! credupe - password-manager export deduplicator
//!
//! Loads a CSV export, removes rows identical in every column, groups
//! near-duplicate logins under a chosen key policy, and keeps one entry per
//! group, either automatically or by asking. Every mutating run leaves a
//! verified backup and an archive of the deleted rows, so it can be undone
//! with [`backup::restore`].

pub mod backup;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod progress;
pub mod prompt;
pub mod records;
pub mod selection;
pub mod signal;
pub mod tui;

use std::io::IsTerminal;

use anyhow::{Context, Result};

use cli::{Cli, Commands};
use commands::AppContext;
use config::Config;
use error::ExitCode;
use signal::ShutdownHandler;

/// Run the application for parsed arguments.
///
/// Sets up logging, color, configuration, and the Ctrl+C handler, then
/// dispatches to the subcommand.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the subcommand
/// fails. `ExitCode::from_error` classifies it.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !std::io::stdout().is_terminal() {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Effective config: {:?}", config);

    let shutdown = match signal::install_handler() {
        Ok(handler) => handler,
        Err(e) => {
            log::warn!("{}; Ctrl+C will terminate immediately", e);
            ShutdownHandler::new()
        }
    };

    let ctx = AppContext {
        config,
        quiet: cli.quiet,
        shutdown,
    };

    match &cli.command {
        Commands::Columns(args) => commands::columns(args, &ctx),
        Commands::Clean(args) => commands::clean(args, &ctx),
        Commands::Backups(args) => commands::backups(args, &ctx),
        Commands::Restore(args) => commands::restore(args, &ctx),
    }
}
