//! Command-line interface definitions for credupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the
//! clap derive API. Global options (verbosity, color, config) come first,
//! then a subcommand.
//!
//! # Example
//!
//! ```bash
//! # Count duplicates without changing anything
//! credupe clean vault.csv
//!
//! # Keep the shortest URI per domain+credential group, after confirmation
//! credupe clean vault.csv --mode auto
//!
//! # Review URI groups one at a time
//! credupe clean vault.csv --mode interactive
//!
//! # Undo a run
//! credupe backups vault.csv
//! credupe restore vault_deleted_entries_20240101_120000.csv
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::cleanup::Mode;
use crate::duplicates::KeyPolicy;

/// Deduplicate password-manager CSV exports.
///
/// credupe removes exact copies, groups near-duplicate logins by URI,
/// username, or domain and credentials, and keeps a backup and an archive
/// of every deleted row so any run can be undone.
#[derive(Debug, Parser)]
#[command(name = "credupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the columns of an export
    Columns(ColumnsArgs),
    /// Find and remove duplicate entries
    Clean(CleanArgs),
    /// List backups and archives of an export, newest first
    Backups(BackupsArgs),
    /// Restore from a backup or a deleted-entries archive
    Restore(RestoreArgs),
}

/// Arguments for the columns subcommand.
#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Export file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the clean subcommand.
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Export file to clean
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// What to do with duplicates
    #[arg(short, long, value_enum, default_value_t = Mode::Analyze)]
    pub mode: Mode,

    /// Compute the deletions but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Cleaned output path (default: <FILE stem>_cleaned.<ext>)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Grouping policy for the selected mode (overrides config)
    ///
    /// Defaults: domain-credential for auto, uri for interactive.
    #[arg(short, long, value_name = "POLICY", value_parser = parse_policy)]
    pub policy: Option<KeyPolicy>,

    /// Strip parenthesized fragments from the name column first
    #[arg(long)]
    pub clean_names: bool,

    /// Skip the typed confirmation in auto mode
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Use line prompts instead of the full-screen selector
    #[arg(long)]
    pub plain: bool,

    /// Show passwords in interactive views
    #[arg(long)]
    pub show_passwords: bool,

    /// Plain progress output and ASCII borders for screen readers
    #[arg(long)]
    pub accessible: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the backups subcommand.
#[derive(Debug, Args)]
pub struct BackupsArgs {
    /// Export file whose artifacts to list
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the restore subcommand.
#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Backup or deleted-entries archive to restore from
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    /// Overwrite the source without asking (backup restores)
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Cleaned file the archive was split from, when `clean` used --output
    #[arg(long, value_name = "PATH")]
    pub cleaned: Option<PathBuf>,
}

/// Parse a grouping policy, rejecting `full-row`.
///
/// Exact copies are always removed first, so `full-row` is not a choice.
///
/// # Examples
///
/// ```
/// use credupe::cli::parse_policy;
/// use credupe::duplicates::KeyPolicy;
///
/// assert_eq!(parse_policy("uri-username").unwrap(), KeyPolicy::UriUsername);
/// assert!(parse_policy("full-row").is_err());
/// ```
pub fn parse_policy(s: &str) -> Result<KeyPolicy, String> {
    match s.parse::<KeyPolicy>()? {
        KeyPolicy::FullRow => Err(
            "full-row duplicates are always removed; use uri, uri-username, or domain-credential"
                .to_string(),
        ),
        policy => Ok(policy),
    }
}
