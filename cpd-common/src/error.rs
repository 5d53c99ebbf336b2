//! Common error types for CPD

use thiserror::Error;

/// Common result type for CPD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the CPD core
///
/// Constraint violations are deliberately NOT represented here: they
/// are first-class result values (`ConstraintViolation` in the pay-band
/// engine), returned as data for the caller to render, never thrown.
#[derive(Error, Debug)]
pub enum Error {
    /// Source workbook missing, unreadable, or missing required sheets
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Invalid enumeration value encountered during ingestion
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
