//! Macro regime scoring.
//!
//! Turns normalized indicators into a regime call:
//! - Polarity: risk indicators are sign-flipped so positive = good for growth
//! - Aggregation: composite mean plus growth and inflation axes
//! - Classification: growth/inflation quadrant or composite tier
//!
//! Quadrants:
//! - Expansion: growth > 0, inflation > 0
//! - Recovery: growth > 0, inflation <= 0
//! - Slowdown: growth <= 0, inflation > 0
//! - Contraction: growth <= 0, inflation <= 0

pub mod aggregator;
pub mod classifier;
pub mod polarity;

pub use aggregator::{composite_score, Aggregate, Aggregator};
pub use classifier::{
    regime_stats, ClassificationMethod, ClassificationMode, Regime, RegimeClassifier,
    RegimeClassifierConfig, RegimeStats, RegimeVerdict, StyleTable, Tier, TierThresholds,
};
pub use polarity::{AdjustedCrossSection, MatchKind, Polarity, PolarityRule, PolarityTable};
