//! Employee data cache controller
//!
//! **[CPD-CACHE-020]** Owns the process-wide roster snapshot: lazy
//! load on first access, explicit invalidation on upload or delete,
//! and an atomic swap of the published `Arc` so readers of the
//! previous generation are never blocked by a reload in progress.
//!
//! **[CPD-CACHE-030]** At most one load is in flight per generation.
//! A second caller arriving during a load waits on the load mutex and
//! then observes the freshly published snapshot instead of racing a
//! duplicate parse.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpd_common::config::{DataFileResolver, DEFAULT_COMPETITOR_INCREASE_RATE};
use cpd_common::{Error, Result};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::models::snapshot::RosterSnapshot;
use crate::services::roster_ingest::{IngestError, IngestOutcome, WorkbookIngestor};

/// Where roster data comes from when the cache misses
///
/// The production source walks the configured candidate paths; tests
/// inject in-memory stubs.
pub trait RosterSource: Send + Sync {
    fn load(&self) -> std::result::Result<IngestOutcome, IngestError>;
}

/// Production source: candidate paths from `DataFileResolver`
pub struct CandidateFileSource {
    resolver: DataFileResolver,
    ingestor: WorkbookIngestor,
}

impl CandidateFileSource {
    pub fn new(resolver: DataFileResolver) -> Self {
        Self {
            resolver,
            ingestor: WorkbookIngestor::new(),
        }
    }
}

impl RosterSource for CandidateFileSource {
    fn load(&self) -> std::result::Result<IngestOutcome, IngestError> {
        self.ingestor.load_from_candidates(&self.resolver.candidates())
    }
}

/// Outcome of an upload attempt
///
/// A failed upload reports `success: false` with a generic message
/// (the detailed cause is logged); the prior snapshot stays valid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
    pub summary: Option<UploadSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub imported: usize,
    pub skipped_rows: usize,
    pub competitor_increase_rate: Option<f64>,
}

/// Cache controller for the roster snapshot
pub struct EmployeeDataCache {
    source: Box<dyn RosterSource>,
    ingestor: WorkbookIngestor,
    snapshot: RwLock<Option<Arc<RosterSnapshot>>>,
    /// Serializes loads and uploads (single writer at a time)
    load_lock: Mutex<()>,
    generation: AtomicU64,
}

impl EmployeeDataCache {
    pub fn new(source: Box<dyn RosterSource>) -> Self {
        Self {
            source,
            ingestor: WorkbookIngestor::new(),
            snapshot: RwLock::new(None),
            load_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Cache backed by the configured candidate file paths
    pub fn with_candidate_files(resolver: DataFileResolver) -> Self {
        Self::new(Box::new(CandidateFileSource::new(resolver)))
    }

    /// Current snapshot, loading from the source on a cache miss
    ///
    /// Repeated calls without an intervening upload or clear return
    /// the same `Arc`. "No data yet" surfaces as `DataSource`, never
    /// as an empty roster.
    pub async fn get_employee_data(&self) -> Result<Arc<RosterSnapshot>> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let _guard = self.load_lock.lock().await;

        // A load that finished while we waited already published
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let outcome = self.source.load().map_err(Error::from)?;
        let snapshot = self.publish(outcome).await;
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next read reloads from source
    pub async fn clear_cache(&self) {
        let mut slot = self.snapshot.write().await;
        if slot.take().is_some() {
            tracing::info!("Employee data cache cleared");
        }
    }

    /// Ingest an uploaded workbook and replace the snapshot on success
    pub async fn upload_workbook(&self, bytes: &[u8]) -> UploadOutcome {
        let _guard = self.load_lock.lock().await;

        match self.ingestor.load_bytes(bytes, "upload") {
            Ok(outcome) => {
                let summary = UploadSummary {
                    imported: outcome.records.len(),
                    skipped_rows: outcome.skipped_rows,
                    competitor_increase_rate: outcome
                        .benchmark
                        .map(|b| b.competitor_increase_rate),
                };
                self.publish(outcome).await;
                UploadOutcome {
                    success: true,
                    message: format!(
                        "Imported {} employees ({} rows skipped)",
                        summary.imported, summary.skipped_rows
                    ),
                    summary: Some(summary),
                }
            }
            Err(e) => {
                // Prior snapshot (if any) stays valid; user sees a
                // generic message, the cause goes to the log
                tracing::warn!("Upload rejected: {}", e);
                UploadOutcome {
                    success: false,
                    message: "Failed to process uploaded file".to_string(),
                    summary: None,
                }
            }
        }
    }

    /// Cached benchmark scalar, or the configured default when absent
    ///
    /// Total: an empty cache is a normal state here, not an error.
    pub async fn competitor_increase_rate(&self) -> f64 {
        self.snapshot
            .read()
            .await
            .as_ref()
            .and_then(|s| s.benchmark)
            .map(|b| b.competitor_increase_rate)
            .unwrap_or(DEFAULT_COMPETITOR_INCREASE_RATE)
    }

    /// Build and atomically publish a new snapshot generation
    async fn publish(&self, outcome: IngestOutcome) -> Arc<RosterSnapshot> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(RosterSnapshot::new(
            outcome.records,
            outcome.benchmark,
            generation,
            outcome.source,
        ));

        let mut slot = self.snapshot.write().await;
        *slot = Some(Arc::clone(&snapshot));
        tracing::info!(
            "Published roster snapshot generation {} ({} employees, source {})",
            generation,
            snapshot.len(),
            snapshot.source
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cpd_common::models::{CompetitorBenchmark, EmployeeRecord, JobLevel, PerformanceRating};
    use std::sync::atomic::AtomicUsize;

    fn record(id: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            name: format!("Employee {}", id),
            department: "Sales".to_string(),
            band: "sales".to_string(),
            level: JobLevel::Lv1,
            performance_rating: PerformanceRating::B,
            current_salary: 4_000_000,
            hire_date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
        }
    }

    /// Counts loads; returns a fixed roster
    struct StubSource {
        loads: AtomicUsize,
        ids: Vec<&'static str>,
    }

    impl StubSource {
        fn new(ids: Vec<&'static str>) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                ids,
            }
        }
    }

    impl RosterSource for StubSource {
        fn load(&self) -> std::result::Result<IngestOutcome, IngestError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(IngestOutcome {
                records: self.ids.iter().map(|id| record(id)).collect(),
                benchmark: Some(CompetitorBenchmark {
                    competitor_increase_rate: 3.5,
                }),
                skipped_rows: 0,
                source: "stub".to_string(),
            })
        }
    }

    struct FailingSource;

    impl RosterSource for FailingSource {
        fn load(&self) -> std::result::Result<IngestOutcome, IngestError> {
            Err(IngestError::CandidatesExhausted(2))
        }
    }

    #[tokio::test]
    async fn test_lazy_load_then_idempotent_reads() {
        let cache = EmployeeDataCache::new(Box::new(StubSource::new(vec!["E001", "E002"])));

        let first = cache.get_employee_data().await.unwrap();
        let second = cache.get_employee_data().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
        assert_eq!(first.generation, 1);
    }

    #[tokio::test]
    async fn test_clear_forces_reload_and_bumps_generation() {
        let source = Box::new(StubSource::new(vec!["E001"]));
        let cache = EmployeeDataCache::new(source);

        let first = cache.get_employee_data().await.unwrap();
        cache.clear_cache().await;
        let second = cache.get_employee_data().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.generation, 2);
    }

    #[tokio::test]
    async fn test_missing_source_leaves_cache_empty() {
        let cache = EmployeeDataCache::new(Box::new(FailingSource));

        let err = cache.get_employee_data().await.unwrap_err();
        assert!(matches!(err, Error::DataSource(_)));

        // Still empty; a later call fails the same way rather than
        // reporting zero employees
        assert!(cache.get_employee_data().await.is_err());
    }

    #[tokio::test]
    async fn test_upload_replaces_snapshot() {
        let cache = EmployeeDataCache::new(Box::new(StubSource::new(vec!["E001", "E002"])));
        let before = cache.get_employee_data().await.unwrap();
        assert!(before.get("E001").is_some());

        // Simulated successful upload with a different roster
        cache
            .publish(IngestOutcome {
                records: vec![record("E003")],
                benchmark: None,
                skipped_rows: 1,
                source: "upload".to_string(),
            })
            .await;

        let after = cache.get_employee_data().await.unwrap();
        assert_eq!(after.len(), 1);
        assert!(after.get("E001").is_none(), "old employee must not survive replace");
        assert!(after.get("E003").is_some());
        assert!(after.generation > before.generation);
    }

    #[tokio::test]
    async fn test_malformed_upload_keeps_prior_snapshot() {
        let cache = EmployeeDataCache::new(Box::new(StubSource::new(vec!["E001"])));
        let before = cache.get_employee_data().await.unwrap();

        let outcome = cache.upload_workbook(b"this is not a workbook").await;
        assert!(!outcome.success);
        assert!(outcome.summary.is_none());

        let after = cache.get_employee_data().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_competitor_rate_defaults_when_empty() {
        let cache = EmployeeDataCache::new(Box::new(FailingSource));
        assert_eq!(
            cache.competitor_increase_rate().await,
            DEFAULT_COMPETITOR_INCREASE_RATE
        );
    }

    #[tokio::test]
    async fn test_competitor_rate_from_snapshot() {
        let cache = EmployeeDataCache::new(Box::new(StubSource::new(vec!["E001"])));
        cache.get_employee_data().await.unwrap();
        assert_eq!(cache.competitor_increase_rate().await, 3.5);
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_load_once() {
        let cache = Arc::new(EmployeeDataCache::new(Box::new(StubSource::new(vec![
            "E001",
        ]))));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.get_employee_data().await.unwrap().generation
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
    }
}
