//! Immutable roster snapshot
//!
//! **[CPD-CACHE-010]** A snapshot is a fully-loaded in-memory copy of
//! the employee roster as of the most recent successful ingestion.
//! Once published behind an `Arc` it is never mutated; readers may use
//! it concurrently without coordination while a replacement loads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cpd_common::models::{CompetitorBenchmark, EmployeeRecord};

/// One fully-built generation of the roster
#[derive(Debug)]
pub struct RosterSnapshot {
    /// Records in source-file row order (drives deterministic iteration)
    records: Vec<EmployeeRecord>,
    /// employee_id -> index into `records`
    index: HashMap<String, usize>,
    /// Competitor benchmark from the secondary sheet, if present
    pub benchmark: Option<CompetitorBenchmark>,
    /// Monotonically increasing load generation
    pub generation: u64,
    /// When this snapshot was published
    pub loaded_at: DateTime<Utc>,
    /// Where the data came from (path or "upload"), for diagnostics
    pub source: String,
}

impl RosterSnapshot {
    pub fn new(
        records: Vec<EmployeeRecord>,
        benchmark: Option<CompetitorBenchmark>,
        generation: u64,
        source: String,
    ) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.employee_id.clone(), i))
            .collect();
        Self {
            records,
            index,
            benchmark,
            generation,
            loaded_at: Utc::now(),
            source,
        }
    }

    /// All records in source order
    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lookup by employee id
    pub fn get(&self, employee_id: &str) -> Option<&EmployeeRecord> {
        self.index.get(employee_id).map(|&i| &self.records[i])
    }
}
