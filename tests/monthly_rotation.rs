use std::path::Path;

use meterlog::core::{Calendar, Zone};
use meterlog::table::{discover_partitions, GeneratorConfig, PartitionKey};
use rusqlite::Connection;
use tempfile::tempdir;

const LA_2023_START: i64 = 1_672_560_000;

fn read_rows(path: &Path) -> Vec<(i64, u8, f64, i64)> {
    let conn = Connection::open(path).expect("open partition");
    let mut stmt = conn
        .prepare("SELECT id, channel, measured_value, recorded_time FROM Measurements ORDER BY id")
        .expect("prepare");
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows");
    rows
}

#[tokio::test]
async fn los_angeles_2023_yields_twelve_monthly_partitions() {
    let dir = tempdir().expect("tempdir");
    let config = GeneratorConfig {
        start_year: 2023,
        span_years: 1,
        timezone: Some("America/Los_Angeles".to_string()),
        output_dir: dir.path().to_path_buf(),
        ..GeneratorConfig::default()
    };
    let zone = config.zone().expect("zone");

    let report = meterlog::generate(&config).await.expect("generate");

    let expected: Vec<PartitionKey> = (1..=12)
        .map(|month| PartitionKey::new(2023, month).expect("key"))
        .collect();
    assert_eq!(report.partition_keys(), expected);
    assert_eq!(discover_partitions(dir.path()).expect("discover"), expected);
    assert_eq!(report.ticks, 8760);
    assert_eq!(report.rows_written, 8760 * 12);
    assert_eq!(report.row_failures, 0);
    assert_eq!(report.commit_failures, 0);
    assert_eq!(report.partition_rolls, 11);
    assert!(report.partitions.iter().all(|p| p.committed));

    // Hours per month in Los Angeles, DST months included.
    let hours: [usize; 12] = [744, 672, 743, 720, 744, 720, 744, 744, 720, 744, 745, 744];
    let mut previous_time = None;
    for (key, hours) in expected.iter().zip(hours) {
        let path = dir.path().join(key.file_name());
        let rows = read_rows(&path);
        assert_eq!(rows.len(), hours * 12, "row count for {key}");

        for (id, channel, _, recorded_time) in &rows {
            assert!((1..=12).contains(channel));
            assert!(*id >= 1);
            let local = zone.decompose(*recorded_time).expect("decompose");
            assert_eq!(local.partition_key().expect("key"), *key, "row at {recorded_time}");
        }
        assert!(rows.windows(2).all(|w| w[0].0 < w[1].0), "ids increase in {key}");

        let first_time = rows[0].3;
        if let Some(prev) = previous_time {
            assert_eq!(first_time - prev, 3600, "no gap before {key}");
        }
        previous_time = Some(rows.last().expect("last row").3);
    }

    let january = read_rows(&dir.path().join("2023-01-monthly.sqlite"));
    assert_eq!(january.len(), 8928);
    let first = january.iter().find(|row| row.1 == 1).expect("channel 1 row");
    assert_eq!(first.2, 0.0);
    assert_eq!(first.3, LA_2023_START);
    assert!(january.iter().all(|row| row.3 >= LA_2023_START));

    let december = read_rows(&dir.path().join("2023-12-monthly.sqlite"));
    let last_value = december.iter().map(|row| row.2).fold(f64::MIN, f64::max);
    assert_eq!(last_value, 8759.0 * 100.0);
}

#[tokio::test]
async fn utc_run_spans_year_boundary_without_extra_partition() {
    let dir = tempdir().expect("tempdir");
    let config = GeneratorConfig {
        start_year: 2024,
        span_years: 1,
        timezone: Some("UTC".to_string()),
        output_dir: dir.path().to_path_buf(),
        value_step: 1.0,
        ..GeneratorConfig::default()
    };

    let report = meterlog::generate(&config).await.expect("generate");
    assert_eq!(report.partitions.len(), 12);
    assert_eq!(report.rows_written, 8784 * 12);

    let february = read_rows(&dir.path().join("2024-02-monthly.sqlite"));
    assert_eq!(february.len(), 29 * 24 * 12);
    assert!(!dir.path().join("2025-01-monthly.sqlite").exists());

    let zone = Zone::Utc;
    let feb_start = zone.resolve(2024, 2, 1, 0).expect("resolve");
    assert_eq!(february.iter().map(|row| row.3).min(), Some(feb_start));
    assert_eq!(february.iter().map(|row| row.2).fold(f64::MAX, f64::min), 744.0);
}
