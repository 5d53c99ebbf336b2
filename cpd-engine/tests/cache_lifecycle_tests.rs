//! Integration tests for the cache controller lifecycle
//!
//! Covers the load/invalidate/replace contract: lazy first load,
//! idempotent reads, clear-then-reload picking up new source data,
//! and failure paths leaving the cache untouched.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use cpd_common::config::DataFileResolver;
use cpd_common::models::{EmployeeRecord, JobLevel, PerformanceRating};
use cpd_common::Error;
use cpd_engine::services::data_cache::{EmployeeDataCache, RosterSource};
use cpd_engine::services::roster_ingest::{IngestError, IngestOutcome};
use std::io::Write;

fn record(id: &str, salary: i64) -> EmployeeRecord {
    EmployeeRecord {
        employee_id: id.to_string(),
        name: format!("Employee {}", id),
        department: "Production".to_string(),
        band: "production".to_string(),
        level: JobLevel::Lv1,
        performance_rating: PerformanceRating::B,
        current_salary: salary,
        hire_date: NaiveDate::from_ymd_opt(2021, 4, 1).unwrap(),
    }
}

/// Source whose roster can be swapped between loads, standing in for
/// a data file replaced on disk
struct SwitchableSource {
    loads: AtomicUsize,
    rosters: Mutex<Vec<Vec<EmployeeRecord>>>,
}

impl SwitchableSource {
    fn new(rosters: Vec<Vec<EmployeeRecord>>) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            rosters: Mutex::new(rosters),
        }
    }
}

impl RosterSource for SwitchableSource {
    fn load(&self) -> Result<IngestOutcome, IngestError> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        let rosters = self.rosters.lock().unwrap();
        let records = rosters[n.min(rosters.len() - 1)].clone();
        Ok(IngestOutcome {
            records,
            benchmark: None,
            skipped_rows: 0,
            source: format!("switchable load {}", n + 1),
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

#[tokio::test]
async fn test_first_access_loads_then_caches() {
    init_tracing();
    let source = SwitchableSource::new(vec![vec![record("E001", 4_000_000)]]);
    let cache = EmployeeDataCache::new(Box::new(source));

    let a = cache.get_employee_data().await.unwrap();
    let b = cache.get_employee_data().await.unwrap();

    assert!(Arc::ptr_eq(&a, &b), "reads without invalidation share one snapshot");
    assert_eq!(a.generation, 1);
}

#[tokio::test]
async fn test_clear_then_reload_reflects_new_source_rows() {
    let source = SwitchableSource::new(vec![
        vec![record("E001", 4_000_000), record("E002", 5_000_000)],
        vec![record("E002", 5_100_000), record("E003", 4_400_000)],
    ]);
    let cache = EmployeeDataCache::new(Box::new(source));

    let before = cache.get_employee_data().await.unwrap();
    assert!(before.get("E001").is_some());

    cache.clear_cache().await;
    let after = cache.get_employee_data().await.unwrap();

    // Exactly the rows of the replacement roster
    assert_eq!(after.len(), 2);
    assert!(after.get("E001").is_none(), "employee absent from new file is gone");
    assert_eq!(after.get("E002").unwrap().current_salary, 5_100_000);
    assert!(after.get("E003").is_some());
    assert_eq!(after.generation, 2);
}

#[tokio::test]
async fn test_old_snapshot_remains_usable_after_replacement() {
    let source = SwitchableSource::new(vec![
        vec![record("E001", 4_000_000)],
        vec![record("E002", 5_000_000)],
    ]);
    let cache = EmployeeDataCache::new(Box::new(source));

    let old = cache.get_employee_data().await.unwrap();
    cache.clear_cache().await;
    let new = cache.get_employee_data().await.unwrap();

    // A reader holding the old Arc still sees a coherent roster
    assert!(old.get("E001").is_some());
    assert!(new.get("E001").is_none());
}

#[tokio::test]
async fn test_concurrent_cold_reads_share_one_generation() {
    let source = SwitchableSource::new(vec![vec![record("E001", 4_000_000)]]);
    let cache = Arc::new(EmployeeDataCache::new(Box::new(source)));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(
            async move { cache.get_employee_data().await.unwrap().generation },
        ));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 1);
    }
}

#[tokio::test]
async fn test_missing_candidates_is_data_source_error() {
    let resolver = DataFileResolver::with_explicit_path("/nonexistent/cpd-roster.xlsx");
    let cache = EmployeeDataCache::with_candidate_files(resolver);

    // No readable candidate: the cache stays empty and reports a
    // DataSource error, not a zero-employee roster
    match cache.get_employee_data().await {
        Err(Error::DataSource(_)) => {}
        Err(other) => panic!("Expected DataSource error, got {}", other),
        Ok(_) => panic!("Expected DataSource error, got a snapshot"),
    }
}

#[tokio::test]
async fn test_unreadable_candidate_file_is_data_source_error() {
    let mut file = tempfile::Builder::new()
        .suffix(".xlsx")
        .tempfile()
        .unwrap();
    file.write_all(b"not actually a workbook").unwrap();

    let resolver = DataFileResolver::with_explicit_path(file.path());
    let cache = EmployeeDataCache::with_candidate_files(resolver);

    assert!(matches!(
        cache.get_employee_data().await,
        Err(Error::DataSource(_))
    ));
}

#[tokio::test]
async fn test_failed_upload_after_clear_leaves_cache_empty() {
    let resolver = DataFileResolver::with_explicit_path("/nonexistent/cpd-roster.xlsx");
    let cache = EmployeeDataCache::with_candidate_files(resolver);

    let outcome = cache.upload_workbook(b"garbage bytes").await;
    assert!(!outcome.success);
    assert!(outcome.summary.is_none());

    assert!(cache.get_employee_data().await.is_err());
}
