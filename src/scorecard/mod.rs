//! Indicator scorecard.
//!
//! Per-indicator contributions ranked for display, each with a four-bucket
//! signal key:
//! - ++ Expansion: score > 1.2
//! - + Recovery: 0 < score <= 1.2
//! - - Slowdown: -1.2 < score <= 0
//! - -- Contraction: score <= -1.2

pub mod builder;

pub use builder::{Scorecard, ScorecardBuilder, ScorecardEntry};
