//! Validation module for indicator data.
//!
//! Reports source failures, basket coverage, history length and staleness
//! before scoring.

pub mod data_integrity;

pub use data_integrity::{CheckResult, DataIntegrityValidator, ValidationReport};
