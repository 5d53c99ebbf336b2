//! Shared data model for the compensation core
//!
//! **[CPD-MODEL-010]** Closed enumerations for job level and performance
//! rating. Every consumer (ingestion, aggregation, pay-band engine)
//! uses these types, so an unknown label can only be rejected in one
//! place: `FromStr` during ingestion. Downstream grouping may then
//! assume the sets are closed.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Ordered seniority tier within a band
///
/// Wire representation matches the roster spreadsheet labels ("Lv.1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobLevel {
    #[serde(rename = "Lv.1")]
    Lv1,
    #[serde(rename = "Lv.2")]
    Lv2,
    #[serde(rename = "Lv.3")]
    Lv3,
    #[serde(rename = "Lv.4")]
    Lv4,
}

impl JobLevel {
    /// All levels in ascending seniority order
    pub const ALL: [JobLevel; 4] = [JobLevel::Lv1, JobLevel::Lv2, JobLevel::Lv3, JobLevel::Lv4];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobLevel::Lv1 => "Lv.1",
            JobLevel::Lv2 => "Lv.2",
            JobLevel::Lv3 => "Lv.3",
            JobLevel::Lv4 => "Lv.4",
        }
    }

    /// Seniority rank, 1-based; used for adjacent-level gap checks
    pub fn rank(&self) -> u8 {
        match self {
            JobLevel::Lv1 => 1,
            JobLevel::Lv2 => 2,
            JobLevel::Lv3 => 3,
            JobLevel::Lv4 => 4,
        }
    }

    /// Next level up, None at the top
    pub fn next_up(&self) -> Option<JobLevel> {
        match self {
            JobLevel::Lv1 => Some(JobLevel::Lv2),
            JobLevel::Lv2 => Some(JobLevel::Lv3),
            JobLevel::Lv3 => Some(JobLevel::Lv4),
            JobLevel::Lv4 => None,
        }
    }
}

impl fmt::Display for JobLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Lv.1" | "Lv1" => Ok(JobLevel::Lv1),
            "Lv.2" | "Lv2" => Ok(JobLevel::Lv2),
            "Lv.3" | "Lv3" => Ok(JobLevel::Lv3),
            "Lv.4" | "Lv4" => Ok(JobLevel::Lv4),
            other => Err(Error::Validation(format!("Unknown job level: {:?}", other))),
        }
    }
}

/// Performance rating, ordered best-to-worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceRating {
    S,
    A,
    B,
    C,
}

impl PerformanceRating {
    /// All ratings, best first
    pub const ALL: [PerformanceRating; 4] = [
        PerformanceRating::S,
        PerformanceRating::A,
        PerformanceRating::B,
        PerformanceRating::C,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceRating::S => "S",
            PerformanceRating::A => "A",
            PerformanceRating::B => "B",
            PerformanceRating::C => "C",
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceRating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "S" => Ok(PerformanceRating::S),
            "A" => Ok(PerformanceRating::A),
            "B" => Ok(PerformanceRating::B),
            "C" => Ok(PerformanceRating::C),
            other => Err(Error::Validation(format!(
                "Unknown performance rating: {:?}",
                other
            ))),
        }
    }
}

/// One roster row per employee
///
/// Created in bulk by the ingestion pipeline, immutable until the next
/// full reload. Field names serialize camelCase for route handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    /// Unique identifier, stable across reloads of the same source file
    pub employee_id: String,
    pub name: String,
    /// Free-text department label
    pub department: String,
    /// Job-family grouping used for pay-band benchmarking
    pub band: String,
    pub level: JobLevel,
    pub performance_rating: PerformanceRating,
    /// Base currency units (non-negative)
    pub current_salary: i64,
    pub hire_date: NaiveDate,
}

/// External industry comparison figure read from the competitor sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorBenchmark {
    /// Average wage-increase rate reported for competitors (percent)
    pub competitor_increase_rate: f64,
}

/// A base-up + merit rate pair fed to the calculators
///
/// Values are not bounded here; range enforcement is a pay-band
/// policy concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateProposal {
    pub base_up_percentage: f64,
    pub merit_increase_percentage: f64,
}
