//! Read-only queries and aggregations over a roster snapshot
//!
//! **[CPD-QRY-010]** Every operation here is a pure function of the
//! snapshot and its parameters: iteration follows the snapshot's
//! stored row order and group keys are sorted, so identical snapshots
//! always produce identical results.

use std::collections::BTreeMap;

use cpd_common::config::{
    MeritGuideline, DEFAULT_BASE_UP_PERCENTAGE, DEFAULT_COMPETITOR_INCREASE_RATE,
};
use cpd_common::models::{EmployeeRecord, JobLevel, PerformanceRating};
use cpd_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::models::snapshot::RosterSnapshot;

/// Query parameters for employee search
///
/// Filters are conjunctive; `search` matches name or id,
/// case-insensitive substring.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Rows per page (must be >= 1)
    #[serde(default = "default_limit")]
    pub limit: usize,

    pub level: Option<JobLevel>,
    pub department: Option<String>,
    pub search: Option<String>,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            level: None,
            department: None,
            search: None,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub employees: Vec<EmployeeRecord>,
    pub page: usize,
    /// Full filtered count, independent of the requested page
    pub total: usize,
    pub total_pages: usize,
}

/// Per-level aggregate statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStats {
    pub level: JobLevel,
    pub employee_count: usize,
    pub average_salary: f64,
    pub average_base_up_percentage: f64,
    pub average_merit_percentage: f64,
    pub average_total_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub employee_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCount {
    pub rating: PerformanceRating,
    pub employee_count: usize,
}

/// Company average recommendation vs the external benchmark
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryComparison {
    pub company_average_increase: f64,
    pub competitor_increase_rate: f64,
    /// company - competitor, positive when ahead of the market
    pub gap: f64,
}

/// Dashboard rollup over the whole snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_employees: usize,
    /// All four levels, ascending; empty levels carry zero counts
    pub level_stats: Vec<LevelStats>,
    /// Sorted by department name; counts sum to total_employees
    pub department_distribution: Vec<DepartmentCount>,
    /// All four ratings, best first
    pub rating_distribution: Vec<RatingCount>,
    pub industry_comparison: IndustryComparison,
}

/// Filtered, paginated employee search
///
/// Requesting a page past the last yields an empty list with the true
/// filtered `total` — not an error.
pub fn search_employees(snapshot: &RosterSnapshot, params: &SearchParams) -> Result<SearchPage> {
    if params.limit < 1 {
        return Err(Error::InvalidInput("limit must be >= 1".to_string()));
    }
    if params.page < 1 {
        return Err(Error::InvalidInput("page is 1-indexed".to_string()));
    }

    let needle = params.search.as_deref().map(str::to_lowercase);
    let department = params.department.as_deref();

    let matches: Vec<&EmployeeRecord> = snapshot
        .records()
        .iter()
        .filter(|r| params.level.map_or(true, |l| r.level == l))
        .filter(|r| department.map_or(true, |d| r.department == d))
        .filter(|r| {
            needle.as_deref().map_or(true, |n| {
                r.name.to_lowercase().contains(n) || r.employee_id.to_lowercase().contains(n)
            })
        })
        .collect();

    let total = matches.len();
    let total_pages = (total + params.limit - 1) / params.limit;
    let offset = (params.page - 1) * params.limit;

    let employees = matches
        .into_iter()
        .skip(offset)
        .take(params.limit)
        .cloned()
        .collect();

    Ok(SearchPage {
        employees,
        page: params.page,
        total,
        total_pages,
    })
}

/// Lookup a single employee by id
pub fn get_employee<'a>(snapshot: &'a RosterSnapshot, employee_id: &str) -> Result<&'a EmployeeRecord> {
    snapshot
        .get(employee_id)
        .ok_or_else(|| Error::NotFound(format!("Employee {}", employee_id)))
}

/// Dashboard rollup with the compiled default recommendation policy
pub fn dashboard_summary(snapshot: &RosterSnapshot) -> DashboardSummary {
    dashboard_summary_with(snapshot, DEFAULT_BASE_UP_PERCENTAGE, &MeritGuideline::default())
}

/// Dashboard rollup under an explicit base-up + merit guideline
pub fn dashboard_summary_with(
    snapshot: &RosterSnapshot,
    base_up_percentage: f64,
    guideline: &MeritGuideline,
) -> DashboardSummary {
    let records = snapshot.records();

    // Per-level accumulators over the closed level set
    let mut level_stats = Vec::with_capacity(JobLevel::ALL.len());
    for level in JobLevel::ALL {
        let group: Vec<&EmployeeRecord> = records.iter().filter(|r| r.level == level).collect();
        let count = group.len();

        let (average_salary, average_merit) = if count == 0 {
            (0.0, 0.0)
        } else {
            let salary_sum: i64 = group.iter().map(|r| r.current_salary).sum();
            let merit_sum: f64 = group
                .iter()
                .map(|r| guideline.merit_for(r.performance_rating))
                .sum();
            (
                salary_sum as f64 / count as f64,
                merit_sum / count as f64,
            )
        };
        let average_base_up = if count == 0 { 0.0 } else { base_up_percentage };

        level_stats.push(LevelStats {
            level,
            employee_count: count,
            average_salary,
            average_base_up_percentage: average_base_up,
            average_merit_percentage: average_merit,
            average_total_percentage: average_base_up + average_merit,
        });
    }

    // Department counts, sorted keys for stable output
    let mut by_department: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *by_department.entry(r.department.as_str()).or_insert(0) += 1;
    }
    let department_distribution = by_department
        .into_iter()
        .map(|(department, employee_count)| DepartmentCount {
            department: department.to_string(),
            employee_count,
        })
        .collect();

    let rating_distribution = PerformanceRating::ALL
        .iter()
        .map(|&rating| RatingCount {
            rating,
            employee_count: records
                .iter()
                .filter(|r| r.performance_rating == rating)
                .count(),
        })
        .collect();

    // Company-wide average recommended increase vs the benchmark
    let company_average_increase = if records.is_empty() {
        0.0
    } else {
        let sum: f64 = records
            .iter()
            .map(|r| base_up_percentage + guideline.merit_for(r.performance_rating))
            .sum();
        sum / records.len() as f64
    };
    let competitor_rate = competitor_increase_rate(snapshot);

    DashboardSummary {
        total_employees: records.len(),
        level_stats,
        department_distribution,
        rating_distribution,
        industry_comparison: IndustryComparison {
            company_average_increase,
            competitor_increase_rate: competitor_rate,
            gap: company_average_increase - competitor_rate,
        },
    }
}

/// Benchmark scalar from the snapshot, or the configured default
///
/// Absence is a normal, representable state; this never fails.
pub fn competitor_increase_rate(snapshot: &RosterSnapshot) -> f64 {
    snapshot
        .benchmark
        .map(|b| b.competitor_increase_rate)
        .unwrap_or(DEFAULT_COMPETITOR_INCREASE_RATE)
}
