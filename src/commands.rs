//! Subcommand handlers.
//!
//! Each handler wires the library to the terminal: it builds the
//! capabilities a run needs (selector, confirmer, progress, interrupt flag),
//! runs it, and renders the structured result. All user-facing text lives
//! here; the library only returns facts.

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use yansi::Paint;

use crate::backup::{self, Artifact, ArtifactKind, RestoreOutcome};
use crate::cleanup::{
    AnalysisReport, AutoConfirm, Cleaner, CleanupOptions, CleanupReport, Mode, RunStatus,
};
use crate::cli::{BackupsArgs, CleanArgs, ColumnsArgs, RestoreArgs};
use crate::config::Config;
use crate::duplicates::GroupingStats;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::prompt::LinePrompt;
use crate::records::{self, ColumnListing, KNOWN_COLUMNS, REQUIRED_COLUMNS};
use crate::signal::ShutdownHandler;
use crate::tui::TuiSelector;

/// Partial URI matches listed individually in the analysis summary.
const LISTED_PARTIAL_MATCHES: usize = 10;

/// Process-wide settings shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Effective configuration
    pub config: Config,
    /// Suppress progress output
    pub quiet: bool,
    /// Ctrl+C flag
    pub shutdown: ShutdownHandler,
}

/// `credupe columns FILE`
///
/// # Errors
///
/// Returns an error if the file is missing, empty, or not a CSV.
pub fn columns(args: &ColumnsArgs, ctx: &AppContext) -> Result<ExitCode> {
    let listing = records::list_columns(&args.file, &ctx.config.sampling_limits())
        .with_context(|| format!("Failed to read columns of {}", args.file.display()))?;

    let mut out = io::stdout().lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&listing)?)?;
    } else {
        print_columns(&mut out, &args.file, &listing)?;
    }
    Ok(ExitCode::Success)
}

/// `credupe clean FILE`
///
/// # Errors
///
/// Returns an error for fatal input, a failed backup, a selector failure,
/// or an interrupt outside interactive selection.
pub fn clean(args: &CleanArgs, ctx: &AppContext) -> Result<ExitCode> {
    let config = &ctx.config;
    let mut options = CleanupOptions::default()
        .with_mode(args.mode)
        .with_dry_run(args.dry_run)
        .with_output(args.output.clone())
        .with_auto_policy(config.auto_policy)
        .with_interactive_policy(config.interactive_policy)
        .with_clean_names(args.clean_names || config.clean_names)
        .with_sampling_limits(config.sampling_limits());
    if let Some(policy) = args.policy {
        options = match args.mode {
            Mode::Interactive => options.with_interactive_policy(policy),
            Mode::Analyze | Mode::Auto => options.with_auto_policy(policy),
        };
    }

    let mask = config.mask_passwords && !args.show_passwords;
    let accessible = args.accessible || config.accessible;
    let use_tui = !args.plain && io::stdin().is_terminal() && io::stdout().is_terminal();

    let progress = Progress::new(ctx.quiet || args.json)
        .with_accessible(accessible)
        .with_hidden_selection(args.mode == Mode::Interactive);

    let mut prompt = None;
    let mut tui = None;
    let mut auto = AutoConfirm;

    let mut cleaner = Cleaner::new(options)
        .with_progress_callback(Arc::new(progress))
        .with_shutdown_flag(ctx.shutdown.get_flag());

    match args.mode {
        Mode::Interactive if use_tui => {
            let selector = tui.insert(
                TuiSelector::new()
                    .with_mask_passwords(mask)
                    .with_accessible(accessible)
                    .with_shutdown_flag(ctx.shutdown.get_flag()),
            );
            cleaner = cleaner.with_selector(selector);
        }
        Mode::Interactive => {
            cleaner = cleaner.with_selector(prompt.insert(stdio_prompt(config, mask)));
        }
        Mode::Auto if args.yes => {
            cleaner = cleaner.with_confirmer(&mut auto);
        }
        Mode::Auto => {
            cleaner = cleaner.with_confirmer(prompt.insert(stdio_prompt(config, mask)));
        }
        Mode::Analyze => {}
    }

    let report = cleaner
        .run(&args.file)
        .with_context(|| format!("Failed to clean {}", args.file.display()))?;
    drop(cleaner);
    drop(tui);

    let mut out = io::stdout().lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report.redacted())?)?;
    } else {
        print_report(&mut out, &report)?;
    }
    Ok(exit_code_for(&report))
}

/// `credupe backups FILE`
///
/// # Errors
///
/// Returns an error if the directory holding `FILE` cannot be read.
pub fn backups(args: &BackupsArgs, _ctx: &AppContext) -> Result<ExitCode> {
    let artifacts = backup::list_backups(&args.file)
        .with_context(|| format!("Failed to list backups of {}", args.file.display()))?;

    let mut out = io::stdout().lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&artifacts)?)?;
    } else {
        print_artifacts(&mut out, &args.file, &artifacts)?;
    }
    Ok(if artifacts.is_empty() {
        ExitCode::NothingToDo
    } else {
        ExitCode::Success
    })
}

/// `credupe restore ARTIFACT`
///
/// # Errors
///
/// Returns an error for unrecognized artifacts, a missing cleaned file, or
/// I/O failures while restoring.
pub fn restore(args: &RestoreArgs, ctx: &AppContext) -> Result<ExitCode> {
    let artifact = backup::parse_artifact(&args.artifact)?;
    if !artifact.path.is_file() {
        anyhow::bail!("artifact not found: {}", artifact.path.display());
    }

    let confirmed = match artifact.kind {
        ArtifactKind::Backup if !args.yes => stdio_prompt(&ctx.config, true)
            .confirm_overwrite(&artifact.source)
            .context("Failed to read confirmation")?,
        _ => true,
    };
    if !confirmed {
        println!("Cancelled. {} was not changed.", artifact.source.display());
        return Ok(ExitCode::NothingToDo);
    }

    let outcome = backup::restore_with_cleaned(&artifact, confirmed, args.cleaned.as_deref())
        .with_context(|| format!("Failed to restore from {}", artifact.path.display()))?;
    print_restore(&mut io::stdout().lock(), &artifact, &outcome)?;
    Ok(ExitCode::Success)
}

fn stdio_prompt(
    config: &Config,
    mask: bool,
) -> LinePrompt<io::StdinLock<'static>, io::Stderr> {
    LinePrompt::stdio()
        .with_mask_passwords(mask)
        .with_confirm_phrase(config.confirm_phrase.clone())
}

/// Map a finished run to the process exit code.
#[must_use]
pub fn exit_code_for(report: &CleanupReport) -> ExitCode {
    if report.is_partial() {
        return ExitCode::PartialSuccess;
    }
    match report.status {
        RunStatus::NothingToDo | RunStatus::Cancelled => ExitCode::NothingToDo,
        RunStatus::Completed | RunStatus::Analyzed | RunStatus::DryRun | RunStatus::Aborted => {
            ExitCode::Success
        }
    }
}

/// Render a column listing.
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn print_columns(out: &mut impl Write, file: &Path, listing: &ColumnListing) -> io::Result<()> {
    print_warnings(out, &listing.warnings)?;
    let rows = match listing.row_count {
        Some(n) => format!("{} rows", n),
        None => "sampled".to_string(),
    };
    writeln!(
        out,
        "{} ({}, {:.1}MB)",
        file.display().bold(),
        rows,
        listing.size_mb
    )?;
    for (i, column) in listing.columns.iter().enumerate() {
        let note = if REQUIRED_COLUMNS.contains(&column.as_str()) {
            " (required)".green().to_string()
        } else if KNOWN_COLUMNS.contains(&column.as_str()) {
            String::new()
        } else {
            " (unknown)".yellow().to_string()
        };
        writeln!(out, "  {:>2}. {}{}", i + 1, column, note)?;
    }
    Ok(())
}

/// Render a cleanup report.
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn print_report(out: &mut impl Write, report: &CleanupReport) -> io::Result<()> {
    print_warnings(out, &report.warnings)?;

    if let Some(analysis) = &report.analysis {
        print_analysis(out, analysis)?;
        writeln!(out, "\nNo changes made. Run with --mode auto or --mode interactive to clean.")?;
        return Ok(());
    }

    if report.names_cleaned > 0 {
        writeln!(out, "Cleaned {} names", report.names_cleaned)?;
    }

    match report.status {
        RunStatus::DryRun => {
            writeln!(out, "{}", "Dry run: no files written".yellow().bold())?;
            writeln!(
                out,
                "Would delete {} rows ({} exact copies, {} from {} {} groups); {} would remain",
                report.total_removed(),
                report.full_duplicates_removed,
                report.selected_removed,
                report.groups_decided,
                report.policy,
                report.rows_after
            )?;
        }
        RunStatus::NothingToDo => writeln!(out, "{}", "No duplicates found.".green())?,
        RunStatus::Cancelled => writeln!(out, "Cancelled. No changes made.")?,
        RunStatus::Completed | RunStatus::Aborted => {
            if report.status == RunStatus::Aborted {
                writeln!(
                    out,
                    "{}",
                    format!(
                        "Stopped after {} of {} groups; earlier decisions were applied.",
                        report.groups_decided, report.groups_total
                    )
                    .yellow()
                )?;
            }
            writeln!(
                out,
                "Removed {} of {} rows ({} exact copies, {} selected); {} remain",
                report.total_removed().bold(),
                report.rows_before,
                report.full_duplicates_removed,
                report.selected_removed,
                report.rows_after
            )?;
            let artifacts = [
                ("Backup", &report.artifacts.backup),
                ("Cleaned", &report.artifacts.cleaned),
                ("Deleted entries", &report.artifacts.deleted),
            ];
            for (label, path) in artifacts {
                if let Some(path) = path {
                    writeln!(out, "  {:<16} {}", format!("{}:", label), path.display())?;
                }
            }
            if let Some(hint) = restore_hint(report) {
                writeln!(out, "To undo the deletions: {}", hint)?;
            }
        }
        RunStatus::Analyzed => {}
    }

    for failure in &report.failures {
        writeln!(
            out,
            "{} could not write {} file {}: {}",
            "error:".red().bold(),
            failure.kind,
            failure.path.display(),
            failure.message
        )?;
    }
    Ok(())
}

fn print_analysis(out: &mut impl Write, analysis: &AnalysisReport) -> io::Result<()> {
    writeln!(out, "{}", "Duplicate analysis".bold())?;
    writeln!(out, "  Total rows:                 {}", analysis.total_rows)?;
    writeln!(
        out,
        "  Exact copies removable:     {}",
        analysis.full_duplicate_rows
    )?;
    print_stats(out, "Same URI", &analysis.uri)?;
    print_stats(out, "Same URI + username", &analysis.uri_username)?;
    match &analysis.domain_credential {
        Some(stats) => print_stats(out, "Same domain + credentials", stats)?,
        None => writeln!(
            out,
            "  Same domain + credentials:  n/a (no login_password column)"
        )?,
    }
    if analysis.domain_fallbacks > 0 {
        writeln!(
            out,
            "  Domains not parsed as URLs: {}",
            analysis.domain_fallbacks
        )?;
    }

    let Some(partial_matches) = &analysis.partial_matches else {
        writeln!(out, "  Nested URIs:                n/a (no login_password column)")?;
        return Ok(());
    };
    if !partial_matches.is_empty() {
        writeln!(
            out,
            "\n{} credential groups with nested URIs (review manually):",
            partial_matches.len()
        )?;
        for found in partial_matches.iter().take(LISTED_PARTIAL_MATCHES) {
            writeln!(out, "  {} ({} records)", found.username, found.indices.len())?;
            for (inner, outer) in &found.pairs {
                writeln!(out, "    {} is within {}", inner, outer)?;
            }
        }
        if partial_matches.len() > LISTED_PARTIAL_MATCHES {
            writeln!(
                out,
                "  ... and {} more",
                partial_matches.len() - LISTED_PARTIAL_MATCHES
            )?;
        }
    }
    Ok(())
}

fn print_stats(out: &mut impl Write, label: &str, stats: &GroupingStats) -> io::Result<()> {
    writeln!(
        out,
        "  {:<27} {} rows in {} groups ({} removable)",
        format!("{}:", label),
        stats.duplicate_records,
        stats.duplicate_groups,
        stats.redundant_records
    )
}

fn print_warnings(out: &mut impl Write, warnings: &[records::ValidationWarning]) -> io::Result<()> {
    for warning in warnings {
        writeln!(out, "{} {}", "warning:".yellow().bold(), warning)?;
    }
    Ok(())
}

/// Render an artifact listing.
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn print_artifacts(out: &mut impl Write, file: &Path, artifacts: &[Artifact]) -> io::Result<()> {
    if artifacts.is_empty() {
        return writeln!(out, "No backups found for {}", file.display());
    }
    writeln!(out, "Artifacts for {} (newest first):", file.display().bold())?;
    for artifact in artifacts {
        writeln!(
            out,
            "  {:<16} {}  {}",
            artifact.kind,
            artifact.created.format("%Y-%m-%d %H:%M:%S"),
            artifact.path.display()
        )?;
    }
    Ok(())
}

/// Undo command for a run whose cleaned output is not at the default path.
///
/// Archive restores pair with `<base>_cleaned.<ext>` unless told otherwise,
/// so a custom output has to be named explicitly.
fn restore_hint(report: &CleanupReport) -> Option<String> {
    let deleted = report.artifacts.deleted.as_ref()?;
    let cleaned = report.artifacts.cleaned.as_ref()?;
    let artifact = Artifact::from_path(deleted)?;
    if backup::cleaned_path(&artifact.source) == *cleaned {
        return None;
    }
    Some(format!(
        "credupe restore {} --cleaned {}",
        deleted.display(),
        cleaned.display()
    ))
}

fn print_restore(out: &mut impl Write, artifact: &Artifact, outcome: &RestoreOutcome) -> io::Result<()> {
    match artifact.kind {
        ArtifactKind::DeletedEntries => {
            if let Some(cleaned) = &outcome.cleaned_path {
                writeln!(out, "Paired with {}", cleaned.display())?;
            }
            writeln!(
                out,
                "Restored {} rows ({} cleaned + {} deleted) to {}",
                outcome.records.len().bold(),
                outcome.cleaned_rows,
                outcome.restored_rows,
                outcome.path.display()
            )
        }
        _ => writeln!(
            out,
            "Restored {} rows to {}",
            outcome.records.len().bold(),
            outcome.path.display()
        ),
    }
}
