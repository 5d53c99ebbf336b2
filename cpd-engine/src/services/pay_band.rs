//! Pay-band rate adjustment validation
//!
//! **[CPD-PB-010]** Stateless validator over a band×level adjustment
//! matrix. Evaluation order is fixed and reproducible:
//! 1. slider range per adjusted cell,
//! 2. adjacent-level effective-pay gap per band,
//! 3. total budget impact against the configured cap.
//!
//! **[CPD-PB-020]** Violations are result values, never errors; the
//! caller re-runs validation on every slider movement, so the pass is
//! linear in the number of cells and never mutates its input.

use cpd_common::config::PayBandPolicy;
use cpd_common::models::JobLevel;
use cpd_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

/// One band×level cell of the adjustment matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayBandCell {
    pub band: String,
    pub level: JobLevel,
    pub headcount: u32,
    /// Mean base pay for this cell, currency units
    pub mean_base_pay: f64,
    /// Current across-the-board rate (percent)
    pub base_up_rate: f64,
    /// Competitiveness index vs the SBL benchmark source
    pub sbl_index: Option<f64>,
    /// Competitiveness index vs the CA benchmark source
    pub ca_index: Option<f64>,
    /// In-progress user edit; None means "no proposal for this cell"
    pub adjusted_base_up_rate: Option<f64>,
}

impl PayBandCell {
    /// Rate in effect under the proposal
    pub fn effective_rate(&self) -> f64 {
        self.adjusted_base_up_rate.unwrap_or(self.base_up_rate)
    }

    /// Mean pay after applying the effective rate
    pub fn effective_mean_pay(&self) -> f64 {
        self.mean_base_pay * (1.0 + self.effective_rate() / 100.0)
    }

    /// Derived competitiveness ratio: mean of the available benchmark
    /// indices, None when neither source covers this cell
    pub fn competitiveness(&self) -> Option<f64> {
        match (self.sbl_index, self.ca_index) {
            (Some(a), Some(b)) => Some((a + b) / 2.0),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

/// Violation categories, wire values snake_case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    BudgetExceeded,
    LevelGapViolation,
    SliderRange,
}

/// Warning is informational; error should block apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One policy violation found by the validation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintViolation {
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Σ headcount × mean base pay × adjusted rate, currency units
    pub total_impact: f64,
    /// total_impact / budget_cap when a cap is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_usage: Option<f64>,
    pub constraint_violations: Vec<ConstraintViolation>,
}

impl CalculationResult {
    /// True when no error-severity violation blocks applying
    pub fn can_apply(&self) -> bool {
        self.constraint_violations
            .iter()
            .all(|v| v.severity != Severity::Error)
    }
}

/// A user's in-progress adjustment scenario
///
/// Owns the matrix being edited; the roster snapshot is referenced by
/// band/level identity only, never embedded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayBandScenario {
    pub id: Uuid,
    pub cells: Vec<PayBandCell>,
    pub policy: PayBandPolicy,
}

impl PayBandScenario {
    pub fn new(cells: Vec<PayBandCell>, policy: PayBandPolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            cells,
            policy,
        }
    }

    /// Record a proposed rate for one cell
    pub fn set_adjustment(&mut self, band: &str, level: JobLevel, rate: f64) -> Result<()> {
        let cell = self.cell_mut(band, level)?;
        cell.adjusted_base_up_rate = Some(rate);
        Ok(())
    }

    /// Drop the proposal for one cell
    pub fn clear_adjustment(&mut self, band: &str, level: JobLevel) -> Result<()> {
        let cell = self.cell_mut(band, level)?;
        cell.adjusted_base_up_rate = None;
        Ok(())
    }

    /// Run the validation pass over the current matrix
    pub fn validate(&self) -> CalculationResult {
        validate_adjustments(&self.cells, &self.policy)
    }

    fn cell_mut(&mut self, band: &str, level: JobLevel) -> Result<&mut PayBandCell> {
        self.cells
            .iter_mut()
            .find(|c| c.band == band && c.level == level)
            .ok_or_else(|| Error::NotFound(format!("Pay band cell {}/{}", band, level)))
    }
}

/// Validate a proposed matrix against policy bounds
///
/// Pure: the input cells are never mutated.
pub fn validate_adjustments(cells: &[PayBandCell], policy: &PayBandPolicy) -> CalculationResult {
    let mut violations = Vec::new();

    // Pass 1: slider range on every adjusted cell
    for cell in cells {
        if let Some(rate) = cell.adjusted_base_up_rate {
            if rate < policy.slider_min || rate > policy.slider_max {
                violations.push(ConstraintViolation {
                    violation_type: ViolationType::SliderRange,
                    severity: Severity::Error,
                    message: format!(
                        "{} {}: adjustment {:.2}% is outside the allowed range [{:.2}%, {:.2}%]",
                        cell.band, cell.level, rate, policy.slider_min, policy.slider_max
                    ),
                    details: Some(json!({
                        "band": cell.band,
                        "level": cell.level,
                        "rate": rate,
                    })),
                });
            }
        }
    }

    // Pass 2: adjacent-level gap within each band, under the proposal
    let mut by_band: BTreeMap<&str, Vec<&PayBandCell>> = BTreeMap::new();
    for cell in cells {
        by_band.entry(cell.band.as_str()).or_default().push(cell);
    }
    for (band, mut band_cells) in by_band {
        band_cells.sort_by_key(|c| c.level.rank());
        for pair in band_cells.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            let lower_pay = lower.effective_mean_pay();
            let higher_pay = higher.effective_mean_pay();
            let required = lower_pay * (1.0 + policy.level_gap_min);

            if higher_pay < lower_pay {
                // Inverted: the senior level would pay less
                violations.push(ConstraintViolation {
                    violation_type: ViolationType::LevelGapViolation,
                    severity: Severity::Error,
                    message: format!(
                        "{}: {} effective pay ({:.0}) falls below {} ({:.0})",
                        band, higher.level, higher_pay, lower.level, lower_pay
                    ),
                    details: Some(json!({
                        "band": band,
                        "lowerLevel": lower.level,
                        "higherLevel": higher.level,
                        "lowerPay": lower_pay,
                        "higherPay": higher_pay,
                    })),
                });
            } else if higher_pay < required {
                violations.push(ConstraintViolation {
                    violation_type: ViolationType::LevelGapViolation,
                    severity: Severity::Warning,
                    message: format!(
                        "{}: gap between {} and {} is below the required {:.1}%",
                        band,
                        lower.level,
                        higher.level,
                        policy.level_gap_min * 100.0
                    ),
                    details: Some(json!({
                        "band": band,
                        "lowerLevel": lower.level,
                        "higherLevel": higher.level,
                        "requiredGap": policy.level_gap_min,
                    })),
                });
            }
        }
    }

    // Pass 3: total budget impact of the adjusted cells
    let total_impact: f64 = cells
        .iter()
        .filter_map(|c| {
            c.adjusted_base_up_rate
                .map(|rate| c.headcount as f64 * c.mean_base_pay * rate / 100.0)
        })
        .sum();

    let budget_usage = policy.budget_cap.map(|cap| total_impact / cap);
    if let Some(cap) = policy.budget_cap {
        if total_impact > cap {
            violations.push(ConstraintViolation {
                violation_type: ViolationType::BudgetExceeded,
                severity: Severity::Error,
                message: format!(
                    "Total budget impact {:.0} exceeds the cap {:.0}",
                    total_impact, cap
                ),
                details: Some(json!({
                    "totalImpact": total_impact,
                    "budgetCap": cap,
                })),
            });
        }
    }

    CalculationResult {
        total_impact,
        budget_usage,
        constraint_violations: violations,
    }
}
