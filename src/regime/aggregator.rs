//! Cross-section aggregation.
//!
//! Reduces an adjusted cross-section to the composite score and the two
//! quadrant axes. An empty cross-section yields `None` everywhere: zero is a
//! real reading, not a placeholder for "no data".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::polarity::AdjustedCrossSection;

/// Aggregated view of one cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub as_of: Option<NaiveDate>,
    /// Unweighted mean of every present value.
    pub composite: Option<f64>,
    pub growth_axis: Option<f64>,
    pub inflation_axis: Option<f64>,
    pub indicators_used: usize,
}

impl Aggregate {
    /// True when no indicator had a value at this period.
    pub fn is_insufficient(&self) -> bool {
        self.composite.is_none()
    }
}

/// Reduces cross-sections using the designated axis indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    growth_axis: String,
    inflation_axis: String,
}

impl Aggregator {
    pub fn new(growth_axis: impl Into<String>, inflation_axis: impl Into<String>) -> Self {
        Self {
            growth_axis: growth_axis.into(),
            inflation_axis: inflation_axis.into(),
        }
    }

    pub fn aggregate(&self, cross_section: &AdjustedCrossSection) -> Aggregate {
        Aggregate {
            as_of: cross_section.as_of,
            composite: composite_score(cross_section),
            growth_axis: cross_section.get(&self.growth_axis),
            inflation_axis: cross_section.get(&self.inflation_axis),
            indicators_used: cross_section.len(),
        }
    }
}

/// Arithmetic mean of the cross-section, `None` when empty.
pub fn composite_score(cross_section: &AdjustedCrossSection) -> Option<f64> {
    if cross_section.is_empty() {
        return None;
    }
    let sum: f64 = cross_section.iter().map(|(_, v)| v).sum();
    Some(sum / cross_section.len() as f64)
}
