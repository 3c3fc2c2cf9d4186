//! Backup creation and artifact discovery.

use credupe::backup::{self, Artifact, ArtifactKind, BackupError};
use filetime::FileTime;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn source(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("vault.csv");
    fs::write(&path, "login_uri,login_username\nhttps://a.com,u\n").unwrap();
    path
}

fn touch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, "login_uri,login_username\n").unwrap();
    path
}

#[test]
fn test_backup_is_byte_identical() {
    let dir = tempdir().unwrap();
    let source = source(&dir);

    let path = backup::backup(&source).unwrap();

    assert_ne!(path, source);
    assert_eq!(fs::read(&path).unwrap(), fs::read(&source).unwrap());
    let artifact = Artifact::from_path(&path).unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Backup);
    assert_eq!(artifact.source, source);
}

#[test]
fn test_backups_in_same_second_do_not_collide() {
    let dir = tempdir().unwrap();
    let source = source(&dir);

    let paths: Vec<PathBuf> = (0..3).map(|_| backup::backup(&source).unwrap()).collect();

    assert_ne!(paths[0], paths[1]);
    assert_ne!(paths[1], paths[2]);
    assert_eq!(backup::list_backups(&source).unwrap().len(), 3);
}

#[test]
fn test_backup_of_missing_source_fails() {
    let dir = tempdir().unwrap();
    let result = backup::backup(&dir.path().join("gone.csv"));
    assert!(matches!(result, Err(BackupError::BackupFailed { .. })));
}

#[test]
fn test_list_backups_newest_first() {
    let dir = tempdir().unwrap();
    let source = source(&dir);
    touch(&dir, "vault_backup_20240101_120000.csv");
    touch(&dir, "vault_deleted_entries_20240301_080000.csv");
    touch(&dir, "vault_backup_20240301_080000_1.csv");
    let cleaned = touch(&dir, "vault_cleaned.csv");
    filetime::set_file_mtime(&cleaned, FileTime::from_unix_time(978_307_200, 0)).unwrap();

    // Artifacts of other sources and unrelated files are ignored.
    touch(&dir, "other_backup_20250101_000000.csv");
    touch(&dir, "vault_notes.csv");

    let names: Vec<String> = backup::list_backups(&source)
        .unwrap()
        .iter()
        .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(
        names,
        vec![
            "vault_backup_20240301_080000_1.csv",
            "vault_deleted_entries_20240301_080000.csv",
            "vault_backup_20240101_120000.csv",
            "vault_cleaned.csv",
        ]
    );
}

#[test]
fn test_list_backups_empty_directory() {
    let dir = tempdir().unwrap();
    let source = source(&dir);
    assert!(backup::list_backups(&source).unwrap().is_empty());
}

#[test]
fn test_parse_artifact_rejects_unknown_names() {
    let result = backup::parse_artifact(std::path::Path::new("/tmp/vault.csv"));
    assert!(matches!(result, Err(BackupError::UnknownArtifact(_))));

    let artifact =
        backup::parse_artifact(std::path::Path::new("/tmp/my_vault_restored_20240102_030405.csv"))
            .unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Restored);
    assert_eq!(artifact.source, PathBuf::from("/tmp/my_vault.csv"));
}
