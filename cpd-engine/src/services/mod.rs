//! Service modules for the compensation core
//!
//! **[CPD-COMP-010]** Component implementations: ingestion pipeline,
//! cache controller, query engine, wage calculator, pay-band
//! constraint engine.

pub mod data_cache;
pub mod pay_band;
pub mod roster_ingest;
pub mod roster_query;
pub mod wage_calc;

pub use data_cache::{CandidateFileSource, EmployeeDataCache, RosterSource, UploadOutcome, UploadSummary};
pub use pay_band::{
    CalculationResult, ConstraintViolation, PayBandCell, PayBandScenario, Severity, ViolationType,
    validate_adjustments,
};
pub use roster_ingest::{IngestError, IngestOutcome, WorkbookIngestor};
pub use roster_query::{
    competitor_increase_rate, dashboard_summary, dashboard_summary_with, get_employee,
    search_employees, DashboardSummary, SearchPage, SearchParams,
};
pub use wage_calc::{
    calculate_total_budget, calculate_wage_increase, BudgetCalculation, BudgetEntry,
    WageIncreaseResult,
};
