//! Indicator normalization.
//!
//! Puts heterogeneous indicators (index levels, percentages, counts) on a
//! common scale with a trailing rolling z-score.

pub mod zscore;

pub use zscore::{rolling_zscore, CrossSection, NormalizedSet, Normalizer, ZScoreSeries, DEFAULT_WINDOW};
