//! # CPD Engine
//!
//! Compensation data cache and budget-allocation engine:
//! - Roster ingestion from uploaded xlsx workbooks
//! - In-memory snapshot cache with lazy load and atomic replacement
//! - Read-only search and dashboard aggregation
//! - Wage-increase arithmetic and budget totals
//! - Pay-band rate adjustment validation
//!
//! Route handlers, persistence, and chart rendering live outside this
//! crate; the services here are the function-level contract they call.

pub mod models;
pub mod services;

pub use cpd_common::{Error, Result};
pub use models::RosterSnapshot;
pub use services::EmployeeDataCache;
