use criterion::{black_box, criterion_group, criterion_main, Criterion};
use credupe::cleanup::{AutoConfirm, Cleaner, CleanupOptions, Mode};
use credupe::duplicates::{find_duplicates, find_full_duplicates, KeyPolicy};
use credupe::normalize::{extract_domain, normalize_records};
use credupe::records::RecordSet;
use std::fs;
use tempfile::TempDir;

// Synthetic export: every third row repeats a login under a longer URI.
fn synthetic_rows(count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| {
            let site = i / 3;
            let uri = match i % 3 {
                0 => format!("https://site{}.example.com", site),
                1 => format!("https://www.site{}.example.com/login", site),
                _ => format!("https://site{}.example.com/", site),
            };
            vec![
                format!("Site {}", site),
                uri,
                format!("user{}", site % 50),
                format!("pw{}", site % 7),
            ]
        })
        .collect()
}

fn headers() -> Vec<String> {
    ["name", "login_uri", "login_username", "login_password"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// 1. Domain extraction
fn bench_extract_domain(c: &mut Criterion) {
    let uris = [
        "https://www.example.com/login?next=/home",
        "accounts.google.com",
        "192.168.1.1:8080/admin",
        "https://www.bücher.de/",
        "androidapp://com.example.app",
    ];
    c.bench_function("extract_domain_mixed", |b| {
        b.iter(|| {
            for uri in &uris {
                black_box(extract_domain(black_box(uri)));
            }
        })
    });
}

// 2. Grouping
fn bench_grouping(c: &mut Criterion) {
    let mut records = RecordSet::from_rows(headers(), synthetic_rows(10_000));
    normalize_records(&mut records).unwrap();

    let mut group = c.benchmark_group("grouping_10k");
    group.bench_function("full_row", |b| {
        b.iter(|| black_box(find_full_duplicates(&records)))
    });
    for policy in [KeyPolicy::Uri, KeyPolicy::UriUsername, KeyPolicy::DomainCredential] {
        group.bench_function(policy.name(), |b| {
            b.iter(|| black_box(find_duplicates(&records, policy).unwrap()))
        });
    }
    group.finish();
}

// 3. Whole pipeline, dry run so nothing is written
fn bench_pipeline(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(headers()).unwrap();
    for row in synthetic_rows(5_000) {
        writer.write_record(row).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);
    assert!(fs::metadata(&path).unwrap().len() > 0);

    c.bench_function("auto_dry_run_5k", |b| {
        b.iter(|| {
            let mut confirm = AutoConfirm;
            let report = Cleaner::new(
                CleanupOptions::default()
                    .with_mode(Mode::Auto)
                    .with_dry_run(true),
            )
            .with_confirmer(&mut confirm)
            .run(&path)
            .unwrap();
            black_box(report);
        })
    });
}

criterion_group!(benches, bench_extract_domain, bench_grouping, bench_pipeline);
criterion_main!(benches);
