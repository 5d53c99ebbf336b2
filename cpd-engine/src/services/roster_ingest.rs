//! Roster workbook ingestion
//!
//! **[CPD-ING-010]** Decodes an uploaded xlsx workbook into typed
//! `EmployeeRecord` rows plus the competitor benchmark scalar from its
//! secondary sheet.
//!
//! **[CPD-ING-020]** Row policy: rows missing a required field are
//! skipped and counted, never fatal. A present-but-unparseable level
//! or rating aborts the whole load — an unknown enumeration value
//! would silently corrupt every grouped aggregate downstream.
//!
//! **[CPD-ING-030]** File loading tries candidate paths in a fixed
//! priority order (see `cpd_common::config::DataFileResolver`),
//! succeeding on the first readable one and reporting which path was
//! used.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader, Xlsx};
use chrono::NaiveDate;
use cpd_common::models::{CompetitorBenchmark, EmployeeRecord, JobLevel, PerformanceRating};
use thiserror::Error;

/// Roster ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// No candidate path could be read
    #[error("No readable data file among {0} candidate paths")]
    CandidatesExhausted(usize),

    /// Cannot open or parse the workbook container
    #[error("Cannot open workbook {0}: {1}")]
    WorkbookOpen(String, String),

    /// Roster sheet missing from the workbook
    #[error("No roster sheet found (looked for {0:?})")]
    MissingRosterSheet(Vec<String>),

    /// Required column absent from the header row
    #[error("Roster sheet is missing required column: {0}")]
    MissingColumn(&'static str),

    /// Present-but-invalid enumeration value (hard failure for the load)
    #[error("Row {row}: invalid {field} value {value:?}")]
    InvalidEnum {
        row: usize,
        field: &'static str,
        value: String,
    },
}

impl From<IngestError> for cpd_common::Error {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::InvalidEnum { .. } => cpd_common::Error::Validation(e.to_string()),
            _ => cpd_common::Error::DataSource(e.to_string()),
        }
    }
}

/// Result of a successful ingestion
#[derive(Debug)]
pub struct IngestOutcome {
    pub records: Vec<EmployeeRecord>,
    pub benchmark: Option<CompetitorBenchmark>,
    /// Rows dropped for missing required fields
    pub skipped_rows: usize,
    /// Path or label the data came from
    pub source: String,
}

/// Column indices resolved from the header row
struct ColumnMap {
    employee_id: usize,
    name: usize,
    department: usize,
    band: usize,
    level: usize,
    rating: usize,
    salary: usize,
    hire_date: usize,
}

/// Candidate roster sheet names, tried in order; falls back to the
/// first sheet in the workbook
const ROSTER_SHEET_NAMES: [&str; 3] = ["社員データ", "EmployeeData", "Employees"];

/// Candidate competitor sheet names
const COMPETITOR_SHEET_NAMES: [&str; 2] = ["競合データ", "CompetitorData"];

/// Label-column keys identifying the competitor increase rate row
const COMPETITOR_RATE_KEYS: [&str; 3] = [
    "他社増加率",
    "competitorIncreaseRate",
    "competitor_increase_rate",
];

/// Workbook-to-roster ingestion pipeline
pub struct WorkbookIngestor;

impl WorkbookIngestor {
    pub fn new() -> Self {
        Self
    }

    /// Try candidate paths in priority order, loading the first
    /// readable one
    pub fn load_from_candidates(&self, candidates: &[PathBuf]) -> Result<IngestOutcome, IngestError> {
        for path in candidates {
            if !path.exists() {
                tracing::debug!("Data file candidate not present: {}", path.display());
                continue;
            }
            match self.load_path(path) {
                Ok(outcome) => {
                    tracing::info!(
                        "Loaded {} employees from {} ({} rows skipped)",
                        outcome.records.len(),
                        path.display(),
                        outcome.skipped_rows
                    );
                    return Ok(outcome);
                }
                // Enum failures must surface, not fall through to a
                // stale candidate further down the list
                Err(e @ IngestError::InvalidEnum { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!("Candidate {} unreadable: {}", path.display(), e);
                }
            }
        }
        tracing::warn!("All {} data file candidates exhausted", candidates.len());
        Err(IngestError::CandidatesExhausted(candidates.len()))
    }

    /// Load a workbook from a filesystem path
    pub fn load_path(&self, path: &Path) -> Result<IngestOutcome, IngestError> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| IngestError::WorkbookOpen(path.display().to_string(), e.to_string()))?;
        self.ingest(&mut workbook, &path.display().to_string())
    }

    /// Load a workbook from uploaded bytes
    pub fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<IngestOutcome, IngestError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| IngestError::WorkbookOpen(source.to_string(), e.to_string()))?;
        self.ingest(&mut workbook, source)
    }

    /// Decode both sheets of an opened workbook
    fn ingest<RS, R>(&self, workbook: &mut R, source: &str) -> Result<IngestOutcome, IngestError>
    where
        RS: std::io::Read + std::io::Seek,
        R: Reader<RS>,
        R::Error: std::fmt::Display,
    {
        let sheet_names = workbook.sheet_names();

        let roster_name = ROSTER_SHEET_NAMES
            .iter()
            .find(|n| sheet_names.iter().any(|s| s.as_str() == **n))
            .map(|n| n.to_string())
            .or_else(|| sheet_names.first().cloned())
            .ok_or_else(|| IngestError::MissingRosterSheet(
                ROSTER_SHEET_NAMES.iter().map(|s| s.to_string()).collect(),
            ))?;

        let roster_range = workbook
            .worksheet_range(&roster_name)
            .map_err(|e| IngestError::WorkbookOpen(source.to_string(), e.to_string()))?;

        let (records, skipped_rows) = decode_roster(&roster_range)?;

        // Competitor sheet is optional; absence is a normal state
        let benchmark = COMPETITOR_SHEET_NAMES
            .iter()
            .find(|n| sheet_names.iter().any(|s| s.as_str() == **n))
            .and_then(|name| workbook.worksheet_range(name).ok())
            .and_then(|range| decode_competitor_rate(&range));

        if benchmark.is_none() {
            tracing::debug!("No competitor benchmark in {}", source);
        }

        Ok(IngestOutcome {
            records,
            benchmark,
            skipped_rows,
            source: source.to_string(),
        })
    }
}

impl Default for WorkbookIngestor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the roster sheet into records plus a skipped-row count
fn decode_roster(range: &Range<Data>) -> Result<(Vec<EmployeeRecord>, usize), IngestError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(IngestError::MissingColumn("employeeId"))?;
    let columns = resolve_columns(header)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    // Data rows are 1-based after the header; +2 gives the sheet row
    // number users see
    for (i, row) in rows.enumerate() {
        let row_number = i + 2;
        match decode_row(row, &columns, row_number)? {
            Some(record) => records.push(record),
            None => {
                tracing::warn!("Skipping incomplete roster row {}", row_number);
                skipped += 1;
            }
        }
    }

    Ok((records, skipped))
}

/// Decode one data row; Ok(None) means "skip and count"
fn decode_row(
    row: &[Data],
    columns: &ColumnMap,
    row_number: usize,
) -> Result<Option<EmployeeRecord>, IngestError> {
    let employee_id = match cell_string(row, columns.employee_id) {
        Some(id) => id,
        None => return Ok(None),
    };

    let (Some(name), Some(department), Some(band)) = (
        cell_string(row, columns.name),
        cell_string(row, columns.department),
        cell_string(row, columns.band),
    ) else {
        return Ok(None);
    };

    // Enumerations: missing cell skips the row, present-but-invalid
    // aborts the load
    let level = match cell_string(row, columns.level) {
        Some(raw) => JobLevel::from_str(&raw).map_err(|_| IngestError::InvalidEnum {
            row: row_number,
            field: "level",
            value: raw,
        })?,
        None => return Ok(None),
    };
    let performance_rating = match cell_string(row, columns.rating) {
        Some(raw) => {
            PerformanceRating::from_str(&raw).map_err(|_| IngestError::InvalidEnum {
                row: row_number,
                field: "performanceRating",
                value: raw,
            })?
        }
        None => return Ok(None),
    };

    let Some(current_salary) = cell_salary(row, columns.salary) else {
        return Ok(None);
    };
    let Some(hire_date) = cell_date(row, columns.hire_date) else {
        return Ok(None);
    };

    Ok(Some(EmployeeRecord {
        employee_id,
        name,
        department,
        band,
        level,
        performance_rating,
        current_salary,
        hire_date,
    }))
}

/// Map header labels (Japanese or English) to column indices
fn resolve_columns(header: &[Data]) -> Result<ColumnMap, IngestError> {
    let find = |labels: &[&str], field: &'static str| -> Result<usize, IngestError> {
        header
            .iter()
            .position(|cell| {
                cell.as_string()
                    .map(|s| labels.iter().any(|l| l.eq_ignore_ascii_case(s.trim())))
                    .unwrap_or(false)
            })
            .ok_or(IngestError::MissingColumn(field))
    };

    Ok(ColumnMap {
        employee_id: find(&["社員番号", "employeeId", "Employee ID", "ID"], "employeeId")?,
        name: find(&["氏名", "name"], "name")?,
        department: find(&["部署", "department"], "department")?,
        band: find(&["バンド", "band"], "band")?,
        level: find(&["等級", "level"], "level")?,
        rating: find(&["評価", "performanceRating", "rating"], "performanceRating")?,
        salary: find(&["現在給与", "currentSalary", "salary"], "currentSalary")?,
        hire_date: find(&["入社日", "hireDate"], "hireDate")?,
    })
}

/// Scan the competitor sheet for a known label and read its adjacent
/// value cell
fn decode_competitor_rate(range: &Range<Data>) -> Option<CompetitorBenchmark> {
    for row in range.rows() {
        let Some(label) = row.first().and_then(|c| c.as_string()) else {
            continue;
        };
        let label = label.trim();
        if COMPETITOR_RATE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(label)) {
            if let Some(rate) = row.get(1).and_then(cell_f64) {
                return Some(CompetitorBenchmark {
                    competitor_increase_rate: rate,
                });
            }
        }
    }
    None
}

/// Non-empty trimmed string from a cell; numeric cells (common for
/// employee ids) render as integers
fn cell_string(row: &[Data], idx: usize) -> Option<String> {
    match row.get(idx)? {
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 => Some((*f as i64).to_string()),
        Data::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Salary coercion: numeric cells rounded to currency units, strings
/// parsed after stripping separators; negatives rejected
fn cell_salary(row: &[Data], idx: usize) -> Option<i64> {
    let value = match row.get(idx)? {
        Data::Int(i) => *i,
        Data::Float(f) => f.round() as i64,
        Data::String(s) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
            cleaned.parse::<i64>().ok()?
        }
        _ => return None,
    };
    (value >= 0).then_some(value)
}

/// Hire-date coercion: Excel date cells, ISO strings, or slash dates
fn cell_date(row: &[Data], idx: usize) -> Option<NaiveDate> {
    match row.get(idx)? {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::DateTimeIso(s) => NaiveDate::parse_from_str(&s[..10.min(s.len())], "%Y-%m-%d").ok(),
        Data::String(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
                .ok()
        }
        // Raw serial number: days since the Excel epoch (1899-12-30)
        Data::Float(serial) => excel_serial_to_date(*serial),
        Data::Int(serial) => excel_serial_to_date(*serial as f64),
        _ => None,
    }
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if serial <= 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(chrono::Days::new(serial as u64))
}
