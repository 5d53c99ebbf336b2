//! # CPD Common Library
//!
//! Shared code for the compensation-planning core:
//! - Error taxonomy (`Error`, `Result`)
//! - Closed data model (`JobLevel`, `PerformanceRating`, `EmployeeRecord`)
//! - Policy configuration and data-file resolution

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
