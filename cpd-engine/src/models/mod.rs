//! In-memory models for the compensation engine

pub mod snapshot;

pub use snapshot::RosterSnapshot;
