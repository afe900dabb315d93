//! Macro regime classifier.
//!
//! Places the growth and inflation axes in a quadrant, or tiers the
//! composite score when only that is available, and looks up the
//! recommended investment style for the result.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::aggregator::Aggregate;

/// Business/inflation cycle regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Growth up, inflation up.
    Expansion,
    /// Growth up, inflation down.
    Recovery,
    /// Growth down, inflation up.
    Slowdown,
    /// Growth down, inflation down.
    Contraction,
    /// Not enough data to classify.
    Unknown,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expansion => "expansion",
            Self::Recovery => "recovery",
            Self::Slowdown => "slowdown",
            Self::Contraction => "contraction",
            Self::Unknown => "unknown",
        }
    }

    /// Description of the regime.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Expansion => "Above-trend growth with rising inflation",
            Self::Recovery => "Improving growth with subdued inflation",
            Self::Slowdown => "Fading growth with sticky inflation",
            Self::Contraction => "Falling growth and falling inflation",
            Self::Unknown => "Insufficient data",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-bucket tier of a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    StrongPositive,
    MildPositive,
    MildNegative,
    StrongNegative,
}

impl Tier {
    /// Regime a composite score in this tier maps to.
    pub fn regime(&self) -> Regime {
        match self {
            Self::StrongPositive => Regime::Expansion,
            Self::MildPositive => Regime::Recovery,
            Self::MildNegative => Regime::Slowdown,
            Self::StrongNegative => Regime::Contraction,
        }
    }

    pub fn bucket_label(&self) -> &'static str {
        match self {
            Self::StrongPositive => "strong positive",
            Self::MildPositive => "mild positive",
            Self::MildNegative => "mild negative",
            Self::StrongNegative => "strong negative",
        }
    }

    /// Scorecard signal key.
    pub fn signal(&self) -> &'static str {
        match self {
            Self::StrongPositive => "++ Expansion",
            Self::MildPositive => "+ Recovery",
            Self::MildNegative => "- Slowdown",
            Self::StrongNegative => "-- Contraction",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Self::StrongPositive | Self::MildPositive)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bucket_label())
    }
}

/// Ordered tier boundaries.
///
/// `score > strong_positive` is the strongest positive tier and
/// `score <= strong_negative` the strongest negative one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub strong_positive: f64,
    pub neutral: f64,
    pub strong_negative: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            strong_positive: 1.2,
            neutral: 0.0,
            strong_negative: -1.2,
        }
    }
}

impl TierThresholds {
    /// Boundaries must be finite and strictly increasing.
    pub fn is_ordered(&self) -> bool {
        [self.strong_negative, self.neutral, self.strong_positive]
            .iter()
            .all(|t| t.is_finite())
            && self.strong_negative < self.neutral
            && self.neutral < self.strong_positive
    }

    pub fn tier(&self, score: f64) -> Tier {
        if score > self.strong_positive {
            Tier::StrongPositive
        } else if score > self.neutral {
            Tier::MildPositive
        } else if score > self.strong_negative {
            Tier::MildNegative
        } else {
            Tier::StrongNegative
        }
    }

    /// Distance from `score` to the closest boundary.
    pub fn margin(&self, score: f64) -> f64 {
        [self.strong_negative, self.neutral, self.strong_positive]
            .iter()
            .map(|t| (score - t).abs())
            .fold(f64::INFINITY, f64::min)
    }
}

/// Regime -> recommended investment style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleTable {
    pub expansion: String,
    pub recovery: String,
    pub slowdown: String,
    pub contraction: String,
    pub unknown: String,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            expansion: "Momentum / cyclicals".to_string(),
            recovery: "Early-cycle / small caps".to_string(),
            slowdown: "Quality / low volatility".to_string(),
            contraction: "Defensive / cash".to_string(),
            unknown: "Hold current allocation".to_string(),
        }
    }
}

impl StyleTable {
    pub fn style(&self, regime: Regime) -> &str {
        match regime {
            Regime::Expansion => &self.expansion,
            Regime::Recovery => &self.recovery,
            Regime::Slowdown => &self.slowdown,
            Regime::Contraction => &self.contraction,
            Regime::Unknown => &self.unknown,
        }
    }

    pub fn with_style(mut self, regime: Regime, style: impl Into<String>) -> Self {
        let slot = match regime {
            Regime::Expansion => &mut self.expansion,
            Regime::Recovery => &mut self.recovery,
            Regime::Slowdown => &mut self.slowdown,
            Regime::Contraction => &mut self.contraction,
            Regime::Unknown => &mut self.unknown,
        };
        *slot = style.into();
        self
    }
}

/// Which inputs decide the regime label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Growth/inflation quadrant; unknown if an axis is missing.
    #[default]
    Quadrant,
    /// Tier of the composite score.
    Composite,
    /// Quadrant when both axes exist, composite tier otherwise.
    QuadrantWithFallback,
}

/// How a particular verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    Quadrant,
    Composite,
    Insufficient,
}

/// Regime classifier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeClassifierConfig {
    #[serde(default)]
    pub mode: ClassificationMode,
    #[serde(default)]
    pub thresholds: TierThresholds,
    #[serde(default)]
    pub styles: StyleTable,
}

/// Classification of one cross-section. Recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeVerdict {
    pub as_of: Option<NaiveDate>,
    pub composite_score: Option<f64>,
    pub growth_axis: Option<f64>,
    pub inflation_axis: Option<f64>,
    pub label: Regime,
    pub recommended_style: String,
    pub composite_tier: Option<Tier>,
    pub method: ClassificationMethod,
    /// Standard normal mass within the deciding margin, in [0, 1].
    pub confidence: f64,
    pub indicators_used: usize,
}

impl RegimeVerdict {
    /// True when the label could not be decided.
    pub fn is_unknown(&self) -> bool {
        self.label == Regime::Unknown
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        let fmt_opt = |v: Option<f64>| v.map(|x| format!("{:+.2}", x)).unwrap_or_else(|| "n/a".to_string());
        format!(
            "{} ({}) | composite {} | growth {} | inflation {} | confidence {:.0}% | style: {}",
            self.label,
            self.label.description(),
            fmt_opt(self.composite_score),
            fmt_opt(self.growth_axis),
            fmt_opt(self.inflation_axis),
            self.confidence * 100.0,
            self.recommended_style
        )
    }
}

/// Stateless regime classifier.
#[derive(Debug, Clone, Default)]
pub struct RegimeClassifier {
    config: RegimeClassifierConfig,
}

impl RegimeClassifier {
    pub fn new(config: RegimeClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegimeClassifierConfig {
        &self.config
    }

    /// Quadrant rule. Zero counts as "not rising" on both axes.
    pub fn classify_quadrant(growth: Option<f64>, inflation: Option<f64>) -> Regime {
        match (growth, inflation) {
            (Some(g), Some(i)) => match (g > 0.0, i > 0.0) {
                (true, true) => Regime::Expansion,
                (true, false) => Regime::Recovery,
                (false, true) => Regime::Slowdown,
                (false, false) => Regime::Contraction,
            },
            _ => Regime::Unknown,
        }
    }

    /// Tier of a single score against the configured thresholds.
    pub fn classify_score(&self, score: f64) -> Tier {
        self.config.thresholds.tier(score)
    }

    /// Classify an aggregate into a full verdict.
    pub fn classify(&self, aggregate: &Aggregate) -> RegimeVerdict {
        let composite_tier = aggregate.composite.map(|s| self.classify_score(s));
        let quadrant = Self::classify_quadrant(aggregate.growth_axis, aggregate.inflation_axis);

        let use_composite = |tier: Option<Tier>| match tier {
            Some(tier) => (tier.regime(), ClassificationMethod::Composite),
            None => (Regime::Unknown, ClassificationMethod::Insufficient),
        };

        let (label, method) = match self.config.mode {
            ClassificationMode::Quadrant if quadrant != Regime::Unknown => (quadrant, ClassificationMethod::Quadrant),
            ClassificationMode::Quadrant => (Regime::Unknown, ClassificationMethod::Insufficient),
            ClassificationMode::Composite => use_composite(composite_tier),
            ClassificationMode::QuadrantWithFallback if quadrant != Regime::Unknown => {
                (quadrant, ClassificationMethod::Quadrant)
            }
            ClassificationMode::QuadrantWithFallback => use_composite(composite_tier),
        };

        let margin = match method {
            ClassificationMethod::Quadrant => aggregate
                .growth_axis
                .zip(aggregate.inflation_axis)
                .map(|(g, i)| g.abs().min(i.abs())),
            ClassificationMethod::Composite => aggregate.composite.map(|s| self.config.thresholds.margin(s)),
            ClassificationMethod::Insufficient => None,
        };

        RegimeVerdict {
            as_of: aggregate.as_of,
            composite_score: aggregate.composite,
            growth_axis: aggregate.growth_axis,
            inflation_axis: aggregate.inflation_axis,
            label,
            recommended_style: self.config.styles.style(label).to_string(),
            composite_tier,
            method,
            confidence: margin.map(confidence_from_margin).unwrap_or(0.0),
            indicators_used: aggregate.indicators_used,
        }
    }
}

/// 2 * Phi(margin) - 1 under the standard normal.
fn confidence_from_margin(margin: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|n| (2.0 * n.cdf(margin.abs()) - 1.0).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Statistics for a regime over a history path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeStats {
    pub regime: Regime,
    pub periods: usize,
    pub pct_of_total: f64,
}

/// Count periods spent in each regime.
pub fn regime_stats(labels: impl IntoIterator<Item = Regime>) -> BTreeMap<Regime, RegimeStats> {
    let mut stats: BTreeMap<Regime, RegimeStats> = BTreeMap::new();
    let mut total = 0usize;

    for regime in labels {
        total += 1;
        stats
            .entry(regime)
            .or_insert(RegimeStats {
                regime,
                periods: 0,
                pct_of_total: 0.0,
            })
            .periods += 1;
    }

    for entry in stats.values_mut() {
        entry.pct_of_total = entry.periods as f64 / total as f64 * 100.0;
    }

    stats
}
