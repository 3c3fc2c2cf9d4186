//! Undoing cleanup runs.

use credupe::backup::{self, ArtifactKind, BackupError};
use credupe::cleanup::{AutoConfirm, Cleaner, CleanupOptions, CleanupReport, Mode};
use credupe::records::load_records;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

const EXPORT: &str = "\
name,login_uri,login_username,login_password
A,https://www.a.com/login,u,p
A,https://a.com,u,p
B,https://b.com,v,q
B,https://b.com,v,q
C,https://c.com,w,r
";

fn cleaned_export(dir: &TempDir) -> (PathBuf, CleanupReport) {
    let source = dir.path().join("vault.csv");
    fs::write(&source, EXPORT).unwrap();
    let mut confirm = AutoConfirm;
    let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(&source)
        .unwrap();
    (source, report)
}

#[test]
fn test_archive_restore_recovers_every_row() {
    let dir = tempdir().unwrap();
    let (source, report) = cleaned_export(&dir);
    assert_eq!(report.rows_after, 3);

    let archive = backup::parse_artifact(&report.artifacts.deleted.unwrap()).unwrap();
    let outcome = backup::restore(&archive, false).unwrap();

    assert_eq!(outcome.cleaned_rows, 3);
    assert_eq!(outcome.restored_rows, 2);
    assert_eq!(outcome.records.len(), report.rows_before);
    assert_eq!(load_records(&outcome.path).unwrap().records.len(), 5);

    let restored = backup::parse_artifact(&outcome.path).unwrap();
    assert_eq!(restored.kind, ArtifactKind::Restored);
    assert_eq!(fs::read_to_string(&source).unwrap(), EXPORT);
}

#[test]
fn test_archive_restore_pairs_with_custom_output() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("vault.csv");
    fs::write(&source, EXPORT).unwrap();
    let output = dir.path().join("elsewhere.csv");

    let mut confirm = AutoConfirm;
    let report = Cleaner::new(
        CleanupOptions::default()
            .with_mode(Mode::Auto)
            .with_output(Some(output.clone())),
    )
    .with_confirmer(&mut confirm)
    .run(&source)
    .unwrap();
    let archive = backup::parse_artifact(&report.artifacts.deleted.unwrap()).unwrap();

    assert!(matches!(
        backup::restore(&archive, false),
        Err(BackupError::CleanedFileMissing(_))
    ));

    let outcome = backup::restore_with_cleaned(&archive, false, Some(&output)).unwrap();
    assert_eq!(outcome.cleaned_path.as_deref(), Some(output.as_path()));
    assert_eq!(outcome.records.len(), report.rows_before);
}

#[test]
fn test_archive_restore_needs_cleaned_file() {
    let dir = tempdir().unwrap();
    let (source, report) = cleaned_export(&dir);
    fs::remove_file(backup::cleaned_path(&source)).unwrap();

    let archive = backup::parse_artifact(&report.artifacts.deleted.unwrap()).unwrap();
    let result = backup::restore(&archive, true);
    assert!(matches!(result, Err(BackupError::CleanedFileMissing(_))));
}

#[test]
fn test_backup_restore_requires_confirmation() {
    let dir = tempdir().unwrap();
    let (source, report) = cleaned_export(&dir);
    fs::write(&source, "login_uri,login_username\n").unwrap();

    let artifact = backup::parse_artifact(&report.artifacts.backup.unwrap()).unwrap();
    let result = backup::restore(&artifact, false);
    assert!(matches!(result, Err(BackupError::NotConfirmed(_))));
    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        "login_uri,login_username\n"
    );

    let outcome = backup::restore(&artifact, true).unwrap();
    assert_eq!(outcome.path, source);
    assert_eq!(outcome.restored_rows, 5);
    assert_eq!(fs::read_to_string(&source).unwrap(), EXPORT);
}

#[test]
fn test_unreadable_backup_leaves_source_alone() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("vault.csv");
    fs::write(&source, EXPORT).unwrap();
    let broken = dir.path().join("vault_backup_20240101_000000.csv");
    fs::write(&broken, "").unwrap();

    let artifact = backup::parse_artifact(&broken).unwrap();
    assert!(backup::restore(&artifact, true).is_err());
    assert_eq!(fs::read_to_string(&source).unwrap(), EXPORT);
}

#[test]
fn test_cleaned_file_cannot_be_restored() {
    let dir = tempdir().unwrap();
    let (source, _) = cleaned_export(&dir);

    let artifact = backup::parse_artifact(&backup::cleaned_path(&source)).unwrap();
    let result = backup::restore(&artifact, true);
    assert!(matches!(result, Err(BackupError::Unsupported { .. })));
}
