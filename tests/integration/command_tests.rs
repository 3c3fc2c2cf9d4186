//! Subcommands driven through parsed command lines.

use clap::Parser;
use credupe::cli::Cli;
use credupe::error::ExitCode;
use credupe::run_app;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const EXPORT: &str = "\
name,login_uri,login_username,login_password
A,https://www.a.com/login,u,p
A,https://a.com,u,p
C,https://c.com,w,r
";

fn setup(dir: &TempDir) -> (PathBuf, PathBuf) {
    let source = dir.path().join("vault.csv");
    fs::write(&source, EXPORT).unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "mask_passwords = true\n").unwrap();
    (source, config)
}

fn run(config: &Path, args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec![
        "credupe",
        "--quiet",
        "--no-color",
        "--config",
        config.to_str().unwrap(),
    ];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_columns_command() {
    let dir = tempdir().unwrap();
    let (source, config) = setup(&dir);
    let code = run(&config, &["columns", source.to_str().unwrap(), "--json"]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_clean_analyze_by_default() {
    let dir = tempdir().unwrap();
    let (source, config) = setup(&dir);
    let code = run(&config, &["clean", source.to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!credupe::backup::cleaned_path(&source).exists());
}

#[test]
fn test_clean_auto_with_yes_then_restore() {
    let dir = tempdir().unwrap();
    let (source, config) = setup(&dir);
    let code = run(
        &config,
        &["clean", source.to_str().unwrap(), "--mode", "auto", "--yes", "--json"],
    )
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(credupe::backup::cleaned_path(&source).exists());

    let archive = credupe::backup::list_backups(&source)
        .unwrap()
        .into_iter()
        .find(|a| a.kind == credupe::backup::ArtifactKind::DeletedEntries)
        .unwrap();
    let code = run(&config, &["restore", archive.path.to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_clean_without_duplicates_is_nothing_to_do() {
    let dir = tempdir().unwrap();
    let (source, config) = setup(&dir);
    fs::write(&source, "login_uri,login_username,login_password\nhttps://a.com,u,p\n").unwrap();
    let code = run(
        &config,
        &["clean", source.to_str().unwrap(), "--mode", "auto", "--yes"],
    )
    .unwrap();
    assert_eq!(code, ExitCode::NothingToDo);
}

#[test]
fn test_backups_without_artifacts() {
    let dir = tempdir().unwrap();
    let (source, config) = setup(&dir);
    let code = run(&config, &["backups", source.to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::NothingToDo);
}

#[test]
fn test_missing_file_is_general_error() {
    let dir = tempdir().unwrap();
    let (_, config) = setup(&dir);
    let missing = dir.path().join("missing.csv");
    let err = run(&config, &["clean", missing.to_str().unwrap()]).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("file not found"));
}

#[test]
fn test_restore_rejects_unknown_artifact() {
    let dir = tempdir().unwrap();
    let (source, config) = setup(&dir);
    assert!(run(&config, &["restore", source.to_str().unwrap()]).is_err());
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = tempdir().unwrap();
    let (source, _) = setup(&dir);
    let config = dir.path().join("nope.toml");
    assert!(run(&config, &["columns", source.to_str().unwrap()]).is_err());
}
