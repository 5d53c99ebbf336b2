//! Wage increase arithmetic
//!
//! Pure and total: every function here is defined for all finite
//! numeric input, including zero and negative percentages (a negative
//! proposal is a valid decrease; range policy lives in the pay-band
//! engine).
//!
//! Rounding policy: half away from zero at the currency unit, applied
//! per employee. Budget totals sum the already-rounded per-employee
//! values — sum-of-rounded, never rounded-sum.

use serde::{Deserialize, Serialize};

/// Per-employee wage increase figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WageIncreaseResult {
    /// base-up + merit (percent)
    pub total_percentage: f64,
    /// Rounded new salary in currency units
    pub new_salary: i64,
    /// new_salary - current_salary
    pub increase_amount: i64,
}

/// One employee's contribution to a budget total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEntry {
    pub current_salary: i64,
    pub suggested_salary: i64,
}

/// Aggregate budget impact over an employee collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCalculation {
    pub current_total: i64,
    pub new_total: i64,
    pub difference: i64,
    /// difference / current_total * 100; zero when current_total is zero
    pub percentage_increase: f64,
}

/// Apply a base-up + merit proposal to one salary
pub fn calculate_wage_increase(
    current_salary: i64,
    base_up_percentage: f64,
    merit_increase_percentage: f64,
) -> WageIncreaseResult {
    let total_percentage = base_up_percentage + merit_increase_percentage;
    // f64::round is half-away-from-zero, which is the policy
    let new_salary = (current_salary as f64 * (1.0 + total_percentage / 100.0)).round() as i64;

    WageIncreaseResult {
        total_percentage,
        new_salary,
        increase_amount: new_salary - current_salary,
    }
}

/// Sum independently-rounded salaries into a budget total
///
/// Empty input yields the all-zero result.
pub fn calculate_total_budget(entries: &[BudgetEntry]) -> BudgetCalculation {
    let current_total: i64 = entries.iter().map(|e| e.current_salary).sum();
    let new_total: i64 = entries.iter().map(|e| e.suggested_salary).sum();
    let difference = new_total - current_total;

    let percentage_increase = if current_total == 0 {
        0.0
    } else {
        difference as f64 / current_total as f64 * 100.0
    };

    BudgetCalculation {
        current_total,
        new_total,
        difference,
        percentage_increase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_case() {
        let r = calculate_wage_increase(50_000_000, 3.2, 2.5);
        assert_eq!(r.total_percentage, 5.7);
        assert_eq!(r.new_salary, 52_850_000);
        assert_eq!(r.increase_amount, 2_850_000);
    }

    #[test]
    fn test_rounding_on_non_exact_case() {
        // 33333333 * 1.03 = 34333332.99 -> rounds up
        let r = calculate_wage_increase(33_333_333, 1.5, 1.5);
        assert_eq!(r.new_salary, 34_333_333);
        assert_eq!(r.increase_amount, 1_000_000);
    }

    #[test]
    fn test_zero_percentages_are_identity() {
        let r = calculate_wage_increase(4_000_000, 0.0, 0.0);
        assert_eq!(r.total_percentage, 0.0);
        assert_eq!(r.new_salary, 4_000_000);
        assert_eq!(r.increase_amount, 0);
    }

    #[test]
    fn test_negative_percentage_is_a_decrease() {
        let r = calculate_wage_increase(4_000_000, -2.0, 0.5);
        assert_eq!(r.total_percentage, -1.5);
        assert_eq!(r.new_salary, 3_940_000);
        assert_eq!(r.increase_amount, -60_000);
    }

    #[test]
    fn test_zero_salary() {
        let r = calculate_wage_increase(0, 3.0, 2.0);
        assert_eq!(r.new_salary, 0);
        assert_eq!(r.increase_amount, 0);
    }

    #[test]
    fn test_total_percentage_is_plain_sum() {
        let r = calculate_wage_increase(1_234_567, 1.1, 2.2);
        assert!((r.total_percentage - 3.3).abs() < 1e-9);
    }

    #[test]
    fn test_empty_budget_is_all_zero() {
        let b = calculate_total_budget(&[]);
        assert_eq!(b.current_total, 0);
        assert_eq!(b.new_total, 0);
        assert_eq!(b.difference, 0);
        assert_eq!(b.percentage_increase, 0.0);
    }

    #[test]
    fn test_budget_totals() {
        let entries = [
            BudgetEntry {
                current_salary: 4_000_000,
                suggested_salary: 4_200_000,
            },
            BudgetEntry {
                current_salary: 6_000_000,
                suggested_salary: 6_150_000,
            },
        ];
        let b = calculate_total_budget(&entries);
        assert_eq!(b.current_total, 10_000_000);
        assert_eq!(b.new_total, 10_350_000);
        assert_eq!(b.difference, 350_000);
        assert!((b.percentage_increase - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_budget_sums_rounded_values_not_rounded_sum() {
        // 1000 * 1.0006 = 1000.6 rounds to 1001 per employee. Three
        // employees total 3003, while rounding the exact sum (3001.8)
        // once would give 3002. The per-employee policy wins.
        let suggested = |s: i64| calculate_wage_increase(s, 0.06, 0.0).new_salary;
        assert_eq!(suggested(1000), 1001);

        let entries: Vec<BudgetEntry> = std::iter::repeat(1000i64)
            .take(3)
            .map(|s| BudgetEntry {
                current_salary: s,
                suggested_salary: suggested(s),
            })
            .collect();
        let b = calculate_total_budget(&entries);
        assert_eq!(b.new_total, 3003);
        assert_eq!(b.difference, 3);
    }
}
