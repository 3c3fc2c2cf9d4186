use credupe::cleanup::{AutoConfirm, Cleaner, CleanupError, CleanupOptions, Mode, RunStatus};
use credupe::normalize::{analyze_domain, extract_domain, DomainKind};
use credupe::records::{list_columns, load_records, SamplingLimits, StoreError, ValidationWarning};
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn write(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("vault.csv");
    fs::write(&path, content).unwrap();
    path
}

fn auto(path: &std::path::Path) -> Result<credupe::cleanup::CleanupReport, CleanupError> {
    let mut confirm = AutoConfirm;
    Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .run(path)
}

#[test]
fn test_empty_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "");
    assert!(matches!(load_records(&path), Err(StoreError::Empty(_))));
    assert!(matches!(
        auto(&path),
        Err(CleanupError::Store(StoreError::Empty(_)))
    ));
}

#[test]
fn test_directory_is_not_a_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_records(dir.path()),
        Err(StoreError::NotAFile(_))
    ));
}

#[test]
fn test_missing_required_column_is_named() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "name,login_uri\nA,https://a.com\n");
    match load_records(&path) {
        Err(StoreError::MissingColumns { missing, .. }) => {
            assert_eq!(missing, vec!["login_username".to_string()]);
        }
        other => panic!("expected MissingColumns, got {:?}", other.map(|l| l.records.len())),
    }
}

#[test]
fn test_header_only_file_has_nothing_to_do() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "login_uri,login_username,login_password\n");
    let report = auto(&path).unwrap();
    assert_eq!(report.rows_before, 0);
    assert_eq!(report.status, RunStatus::NothingToDo);
}

#[test]
fn test_quoted_fields_survive_cleaning() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "name,notes,login_uri,login_username,login_password\n\
         \"Bank, main\",\"line one\nline \"\"two\"\"\",https://bank.com/login,me,pw\n\
         Bank,,https://bank.com,me,pw\n",
    );

    let report = auto(&path).unwrap();
    assert_eq!(report.selected_removed, 1);

    let deleted = load_records(&report.artifacts.deleted.unwrap()).unwrap().records;
    let notes = deleted.column_index("notes").unwrap();
    let name = deleted.column_index("name").unwrap();
    assert_eq!(deleted.records()[0].field(name), "Bank, main");
    assert_eq!(deleted.records()[0].field(notes), "line one\nline \"two\"");
}

#[test]
fn test_unknown_columns_are_kept_and_reported() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "login_uri,login_username,login_password,custom\n\
         https://a.com,u,p,x\n\
         https://a.com/login,u,p,y\n",
    );

    let report = auto(&path).unwrap();
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ValidationWarning::UnexpectedColumns { columns } if columns == &["custom".to_string()]
    )));

    let cleaned = load_records(&report.artifacts.cleaned.unwrap()).unwrap().records;
    assert_eq!(
        cleaned.headers(),
        &["login_uri", "login_username", "login_password", "custom"]
    );
    assert_eq!(cleaned.records()[0].field(3), "x");
}

#[test]
fn test_derived_columns_in_input_are_dropped_on_output() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "login_uri,login_username,login_password,domain\n\
         https://a.com,u,p,stale\n\
         https://www.a.com/x,u,p,stale\n",
    );

    let report = auto(&path).unwrap();
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ValidationWarning::TransientColumnInInput { column } if column == "domain"
    )));
    assert_eq!(report.selected_removed, 1);

    let cleaned = load_records(&report.artifacts.cleaned.unwrap()).unwrap().records;
    assert_eq!(
        cleaned.headers(),
        &["login_uri", "login_username", "login_password"]
    );
}

#[test]
fn test_ragged_rows_are_padded() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "login_uri,login_username,login_password\nhttps://a.com,u\nhttps://b.com,v,q,extra\n",
    );
    let loaded = load_records(&path).unwrap();
    assert_eq!(loaded.records.len(), 2);
    assert_eq!(loaded.records.records()[0].field(2), "");
    assert!(loaded
        .warnings
        .contains(&ValidationWarning::RaggedRows { count: 2 }));
}

#[test]
fn test_domain_edge_cases() {
    assert_eq!(extract_domain("https://www.bücher.de/shop"), "https://www.bücher.de/shop");
    assert_eq!(extract_domain("https://010.0.0.1/router"), "010.0.0.1");
    assert_eq!(extract_domain("https://Login.Example.COM:8443/"), "login.example.com");
    assert_eq!(analyze_domain("localhost:3000").kind, DomainKind::Localhost);
    assert_eq!(analyze_domain("notes").kind, DomainKind::Opaque);
}

#[test]
fn test_column_listing_samples_large_files() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "login_uri,login_username\nhttps://a.com,u\nhttps://b.com,v\n",
    );

    let full = list_columns(&path, &SamplingLimits::default()).unwrap();
    assert_eq!(full.row_count, Some(2));
    assert!(!full.sampled);

    let limits = SamplingLimits {
        large_file_warn_mb: 0.0,
        sample_threshold_mb: 0.0,
        sample_rows: 1,
    };
    let sampled = list_columns(&path, &limits).unwrap();
    assert!(sampled.sampled);
    assert_eq!(sampled.row_count, None);
    assert_eq!(sampled.columns, vec!["login_uri", "login_username"]);
    assert!(matches!(
        sampled.warnings.as_slice(),
        [ValidationWarning::LargeFile { .. }]
    ));
}

#[test]
fn test_interrupt_before_selection_stops_auto_run() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "login_uri,login_username,login_password\nhttps://a.com,u,p\nhttps://a.com,u,p\n",
    );
    let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let mut confirm = AutoConfirm;
    let result = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
        .with_confirmer(&mut confirm)
        .with_shutdown_flag(flag)
        .run(&path);
    assert!(matches!(result, Err(CleanupError::Interrupted)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
