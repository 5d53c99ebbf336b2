//! Policy configuration and data-file resolution
//!
//! **[CPD-CFG-010]** Single source of truth for the closed policy
//! values (default rates, merit guideline, pay-band bounds) consumed
//! by ingestion, aggregation, and the constraint engine alike.
//!
//! **[CPD-CFG-020]** Roster workbook location follows a 4-tier
//! priority order:
//! 1. Explicit path argument (highest priority)
//! 2. `CPD_DATA_FILE` environment variable
//! 3. `data_file` key in the platform config TOML
//! 4. Compiled default candidates (fallback)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::PerformanceRating;
use crate::{Error, Result};

/// Environment variable naming the roster workbook
pub const DATA_FILE_ENV_VAR: &str = "CPD_DATA_FILE";

/// Fallback competitor increase rate when the benchmark sheet is absent
pub const DEFAULT_COMPETITOR_INCREASE_RATE: f64 = 3.0;

/// Org-wide default base-up recommendation (percent)
pub const DEFAULT_BASE_UP_PERCENTAGE: f64 = 3.2;

/// Per-rating merit increase guideline (percent)
///
/// Dashboard recommendations derive per-employee merit from this
/// table; per-level averages then reflect each level's rating mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeritGuideline {
    pub s: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl MeritGuideline {
    pub fn merit_for(&self, rating: PerformanceRating) -> f64 {
        match rating {
            PerformanceRating::S => self.s,
            PerformanceRating::A => self.a,
            PerformanceRating::B => self.b,
            PerformanceRating::C => self.c,
        }
    }
}

impl Default for MeritGuideline {
    fn default() -> Self {
        Self {
            s: 4.0,
            a: 2.5,
            b: 1.5,
            c: 0.5,
        }
    }
}

/// Pay-band adjustment policy bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayBandPolicy {
    /// Lower bound on any single adjustment (percent)
    pub slider_min: f64,
    /// Upper bound on any single adjustment (percent)
    pub slider_max: f64,
    /// Optional ceiling on total budget impact (currency units)
    pub budget_cap: Option<f64>,
    /// Minimum proportional gap required between adjacent levels'
    /// effective pay (0.03 = 3%)
    pub level_gap_min: f64,
}

impl Default for PayBandPolicy {
    fn default() -> Self {
        Self {
            slider_min: -5.0,
            slider_max: 10.0,
            budget_cap: None,
            level_gap_min: 0.03,
        }
    }
}

/// Resolves the ordered list of candidate roster workbook paths
///
/// Ingestion tries each candidate in order and succeeds on the first
/// readable one; only the exhausted list is an error.
#[derive(Debug, Clone, Default)]
pub struct DataFileResolver {
    explicit_path: Option<PathBuf>,
}

impl DataFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin an explicit path (priority 1), e.g. from a CLI argument
    pub fn with_explicit_path(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit_path: Some(path.into()),
        }
    }

    /// Resolve candidate paths in priority order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        // Priority 1: explicit path argument
        if let Some(path) = &self.explicit_path {
            candidates.push(path.clone());
        }

        // Priority 2: environment variable
        if let Ok(path) = std::env::var(DATA_FILE_ENV_VAR) {
            if !path.is_empty() {
                candidates.push(PathBuf::from(path));
            }
        }

        // Priority 3: TOML config file
        match data_file_from_config() {
            Ok(path) => candidates.push(path),
            Err(e) => tracing::debug!("No data_file from config: {}", e),
        }

        // Priority 4: compiled defaults
        candidates.push(PathBuf::from("data/employee_data.xlsx"));
        candidates.push(PathBuf::from("employee_data.xlsx"));

        candidates
    }
}

/// Read the `data_file` key from the platform config file
fn data_file_from_config() -> Result<PathBuf> {
    let config_path = platform_config_path()?;
    let toml_content = std::fs::read_to_string(&config_path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", config_path.display(), e)))?;
    let config: toml::Value = toml::from_str(&toml_content)
        .map_err(|e| Error::Config(format!("Malformed config file: {}", e)))?;

    config
        .get("data_file")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| Error::Config("No data_file key in config".to_string()))
}

/// Platform config file path (~/.config/cpd/config.toml on Linux)
fn platform_config_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("cpd").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cpd/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merit_guideline_defaults_ordered_by_rating() {
        let g = MeritGuideline::default();
        assert!(g.s > g.a && g.a > g.b && g.b > g.c);
        assert_eq!(g.merit_for(PerformanceRating::A), 2.5);
    }

    #[test]
    fn test_pay_band_policy_defaults() {
        let p = PayBandPolicy::default();
        assert_eq!(p.slider_min, -5.0);
        assert_eq!(p.slider_max, 10.0);
        assert!(p.budget_cap.is_none());
        assert_eq!(p.level_gap_min, 0.03);
    }

    #[test]
    fn test_explicit_path_is_first_candidate() {
        let resolver = DataFileResolver::with_explicit_path("/tmp/roster.xlsx");
        let candidates = resolver.candidates();
        assert_eq!(candidates[0], PathBuf::from("/tmp/roster.xlsx"));
        // Compiled defaults are always present at the tail
        assert!(candidates.contains(&PathBuf::from("data/employee_data.xlsx")));
        assert!(candidates.contains(&PathBuf::from("employee_data.xlsx")));
    }
}
