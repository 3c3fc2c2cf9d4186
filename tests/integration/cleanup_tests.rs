//! End-to-end cleanup runs against CSV files on disk.

use credupe::backup::{self, ArtifactKind};
use credupe::cleanup::{
    AutoConfirm, Cleaner, CleanupError, CleanupOptions, Mode, RunStatus, Stage,
};
use credupe::duplicates::KeyPolicy;
use credupe::prompt::LinePrompt;
use credupe::records::{load_records, SamplingLimits, ValidationWarning};
use credupe::selection::{ScriptedSelector, SelectorResponse};
use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const HEADER: &str = "folder,favorite,type,name,notes,fields,reprompt,login_uri,login_username,login_password,login_totp";

fn write_export(dir: &TempDir, rows: &[&str]) -> PathBuf {
    let path = dir.path().join("vault.csv");
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

fn login(name: &str, uri: &str, user: &str, pass: &str) -> String {
    format!(",,login,{},,,0,{},{},{},", name, uri, user, pass)
}

fn sample_export(dir: &TempDir) -> PathBuf {
    let rows = [
        login("Example", "https://www.example.com/login", "alice", "pw1"),
        login("Example", "https://example.com/", "alice", "pw1"),
        login("Other", "https://other.org", "bob", "pw2"),
        login("Other", "https://other.org", "bob", "pw2"),
        login("Mail", "https://mail.example.com", "carol", "pw3"),
    ];
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    write_export(dir, &refs)
}

fn names(path: &Path) -> Vec<String> {
    let set = load_records(path).unwrap().records;
    let idx = set.column_index("name").unwrap();
    set.iter().map(|r| r.field(idx).to_string()).collect()
}

fn uris(path: &Path) -> Vec<String> {
    let set = load_records(path).unwrap().records;
    let idx = set.column_index("login_uri").unwrap();
    set.iter().map(|r| r.field(idx).to_string()).collect()
}

#[test]
fn test_auto_mode_keeps_shortest_uri() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);
    let original = fs::read(&source).unwrap();

    let mut confirm = AutoConfirm;
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source)
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.rows_before, 5);
    assert_eq!(report.full_duplicates_removed, 1);
    assert_eq!(report.selected_removed, 1);
    assert_eq!(report.rows_after, 3);

    let cleaned = report.artifacts.cleaned.clone().unwrap();
    assert_eq!(cleaned, backup::cleaned_path(&source));
    assert_eq!(
        uris(&cleaned),
        vec![
            "https://example.com/",
            "https://other.org",
            "https://mail.example.com"
        ]
    );

    // The source itself is never modified.
    assert_eq!(fs::read(&source).unwrap(), original);
    let backup_path = report.artifacts.backup.clone().unwrap();
    assert_eq!(fs::read(backup_path).unwrap(), original);

    let deleted = report.artifacts.deleted.clone().unwrap();
    assert_eq!(load_records(&deleted).unwrap().records.len(), 2);
}

#[test]
fn test_exact_copies_collapse_to_first() {
    let dir = tempdir().unwrap();
    let a = login("A", "https://a.com", "u", "p");
    let b = login("B", "https://b.com", "v", "q");
    let source = write_export(&dir, &[&a, &a, &b]);

    let mut confirm = AutoConfirm;
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source)
        .unwrap();

    assert_eq!(report.full_duplicates_removed, 1);
    assert_eq!(report.selected_removed, 0);
    assert_eq!(names(&report.artifacts.cleaned.unwrap()), vec!["A", "B"]);
}

#[test]
fn test_dry_run_matches_real_run_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);

    let mut confirm = AutoConfirm;
    let dry = Cleaner::new(
        CleanupOptions::default()
            .with_mode(Mode::Auto)
            .with_dry_run(true),
    )
    .with_confirmer(&mut confirm)
    .run(&source)
    .unwrap();
    assert_eq!(dry.status, RunStatus::DryRun);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    assert!(backup::list_backups(&source).unwrap().is_empty());

    let real = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source)
        .unwrap();
    assert_eq!(dry.total_removed(), real.total_removed());
    assert_eq!(dry.plan.unwrap().would_remain, real.rows_after);
}

#[test]
fn test_analyze_writes_nothing() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);

    let report = Cleaner::new(CleanupOptions::default()).run(&source).unwrap();

    assert_eq!(report.status, RunStatus::Analyzed);
    let analysis = report.analysis.unwrap();
    assert_eq!(analysis.total_rows, 5);
    assert_eq!(analysis.full_duplicate_rows, 1);
    assert_eq!(analysis.domain_credential.unwrap().duplicate_groups, 1);
    assert!(report.plan.is_none());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_configured_large_file_threshold_applies_to_runs() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);
    let is_large = |w: &ValidationWarning| matches!(w, ValidationWarning::LargeFile { .. });

    let default_run = Cleaner::new(CleanupOptions::default()).run(&source).unwrap();
    assert!(!default_run.warnings.iter().any(is_large));

    let limits = SamplingLimits {
        large_file_warn_mb: 0.0,
        ..SamplingLimits::default()
    };
    let report = Cleaner::new(CleanupOptions::default().with_sampling_limits(limits))
        .run(&source)
        .unwrap();
    assert!(report.warnings.iter().any(is_large));
}

#[test]
fn test_no_duplicates_is_nothing_to_do() {
    let dir = tempdir().unwrap();
    let a = login("A", "https://a.com", "u", "p");
    let b = login("B", "https://b.com", "u", "p");
    let source = write_export(&dir, &[&a, &b]);

    let mut confirm = AutoConfirm;
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source)
        .unwrap();

    assert_eq!(report.status, RunStatus::NothingToDo);
    assert!(report.artifacts.backup.is_none());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_declined_confirmation_writes_nothing() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);

    let mut prompt = LinePrompt::new(Cursor::new("no thanks\n"), Vec::new());
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut prompt)
        .run(&source)
        .unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    let shown = String::from_utf8(prompt.into_output()).unwrap();
    assert!(shown.contains("DELETE"));
}

#[test]
fn test_typed_phrase_confirms() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);

    let mut prompt = LinePrompt::new(Cursor::new("delete\n"), Vec::new());
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut prompt)
        .run(&source)
        .unwrap();
    assert_eq!(report.status, RunStatus::Completed);
}

#[test]
fn test_auto_requires_a_confirmer() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);

    let result = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto)).run(&source);
    assert!(matches!(result, Err(CleanupError::ConfirmationRequired)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_interactive_abort_applies_earlier_decisions() {
    let dir = tempdir().unwrap();
    let rows = [
        login("A1", "https://a.com", "u1", "p"),
        login("A2", "https://a.com", "u2", "p"),
        login("B1", "https://b.com", "u1", "p"),
        login("B2", "https://b.com", "u2", "p"),
    ];
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let source = write_export(&dir, &refs);

    let mut selector = ScriptedSelector::new([
        SelectorResponse::Delete(BTreeSet::from([1])),
        SelectorResponse::Abort,
    ]);
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Interactive))
        .with_selector(&mut selector)
        .run(&source)
        .unwrap();

    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.groups_total, 2);
    assert_eq!(report.groups_decided, 1);
    assert_eq!(selector.shown().len(), 2);
    assert_eq!(selector.shown()[0].policy, KeyPolicy::Uri);
    assert_eq!(
        names(&report.artifacts.cleaned.unwrap()),
        vec!["A1", "B1", "B2"]
    );
}

#[test]
fn test_interactive_uri_policy_groups_raw_uri() {
    let dir = tempdir().unwrap();
    let rows = [
        login("A1", "https://a.com", "u1", "p"),
        login("A2", "https://a.com/", "u2", "p"),
        login("A3", "https://a.com", "u3", "p"),
    ];
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let source = write_export(&dir, &refs);

    let mut selector = ScriptedSelector::new([]);
    let report = Cleaner::new(
        CleanupOptions::default()
            .with_mode(Mode::Interactive)
            .with_dry_run(true),
    )
    .with_selector(&mut selector)
    .run(&source)
    .unwrap();

    assert_eq!(report.status, RunStatus::DryRun);
    assert_eq!(selector.shown().len(), 1);
    let shown: Vec<usize> = selector.shown()[0]
        .rows
        .iter()
        .map(|row| row.original_index)
        .collect();
    assert_eq!(shown, vec![0, 2]);
}

#[test]
fn test_domain_policy_requires_password_column() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("vault.csv");
    fs::write(
        &source,
        "name,login_uri,login_username\nA,https://a.com,u\nB,https://a.com,u\n",
    )
    .unwrap();

    let mut confirm = AutoConfirm;
    let result = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source);
    assert!(matches!(result, Err(CleanupError::Group(_))));

    let report = Cleaner::new(
        CleanupOptions::default()
            .with_mode(Mode::Auto)
            .with_auto_policy(KeyPolicy::UriUsername),
    )
    .with_confirmer(&mut confirm)
    .run(&source)
    .unwrap();
    assert_eq!(report.selected_removed, 1);
}

#[test]
fn test_custom_output_and_name_cleanup() {
    let dir = tempdir().unwrap();
    let rows = [
        login("GitHub (2)", "https://github.com/login", "me", "p"),
        login("GitHub", "https://github.com", "me", "p"),
    ];
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let source = write_export(&dir, &refs);
    let output = dir.path().join("out").join("clean.csv");
    fs::create_dir(dir.path().join("out")).unwrap();

    let mut confirm = AutoConfirm;
    let report = Cleaner::new(
        CleanupOptions::default()
            .with_mode(Mode::Auto)
            .with_output(Some(output.clone()))
            .with_clean_names(true),
    )
    .with_confirmer(&mut confirm)
    .run(&source)
    .unwrap();

    assert_eq!(report.names_cleaned, 1);
    assert_eq!(report.artifacts.cleaned.as_deref(), Some(output.as_path()));
    assert_eq!(names(&output), vec!["GitHub"]);
    assert_eq!(uris(&output), vec!["https://github.com"]);
    assert!(!backup::cleaned_path(&source).exists());
}

#[test]
fn test_stage_reports_in_order() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);

    let mut confirm = AutoConfirm;
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source)
        .unwrap();

    let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Load,
            Stage::StripFullDuplicates,
            Stage::Normalize,
            Stage::Group,
            Stage::Select,
            Stage::ApplyDeletions,
            Stage::Persist,
        ]
    );
    assert_eq!(report.stage(Stage::Persist).unwrap().found, 2);
}

#[test]
fn test_artifacts_are_listed_for_source() {
    let dir = tempdir().unwrap();
    let source = sample_export(&dir);

    let mut confirm = AutoConfirm;
    Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source)
        .unwrap();

    let kinds: BTreeSet<String> = backup::list_backups(&source)
        .unwrap()
        .iter()
        .map(|a| a.kind.to_string())
        .collect();
    assert!(kinds.contains(&ArtifactKind::Backup.to_string()));
    assert!(kinds.contains(&ArtifactKind::DeletedEntries.to_string()));
}
