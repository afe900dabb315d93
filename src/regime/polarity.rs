//! Polarity table and adjuster.
//!
//! Risk indicators (claims, spreads, volatility, ...) rise when growth
//! deteriorates. Their z-scores are negated so that every adjusted value reads
//! "positive = good for growth". The table is configuration: rules match an
//! indicator name exactly or by substring, and unmatched names keep their sign.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalize::CrossSection;

/// Direction of an indicator relative to growth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Rising is good for growth (+1).
    #[default]
    Direct,
    /// Rising is bad for growth (-1).
    Inverse,
}

impl Polarity {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Direct => 1.0,
            Self::Inverse => -1.0,
        }
    }
}

/// How a rule's pattern is compared with an indicator name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    #[default]
    Contains,
}

fn default_rule_polarity() -> Polarity {
    Polarity::Inverse
}

/// One entry of the polarity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolarityRule {
    pub pattern: String,
    #[serde(rename = "match", default)]
    pub kind: MatchKind,
    #[serde(default = "default_rule_polarity")]
    pub polarity: Polarity,
}

impl PolarityRule {
    pub fn exact(name: &str, polarity: Polarity) -> Self {
        Self {
            pattern: name.to_string(),
            kind: MatchKind::Exact,
            polarity,
        }
    }

    pub fn contains(pattern: &str, polarity: Polarity) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind: MatchKind::Contains,
            polarity,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self.kind {
            MatchKind::Exact => name == self.pattern,
            MatchKind::Contains => name.contains(self.pattern.as_str()),
        }
    }
}

/// Indicator name -> sign lookup.
///
/// Exact rules take precedence over substring rules; among substring rules
/// the first match in table order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolarityTable {
    rules: Vec<PolarityRule>,
}

impl PolarityTable {
    pub fn new(rules: Vec<PolarityRule>) -> Self {
        Self { rules }
    }

    /// Invert every indicator whose name contains one of `patterns`.
    pub fn inverse_containing(patterns: &[&str]) -> Self {
        Self::new(
            patterns
                .iter()
                .map(|p| PolarityRule::contains(p, Polarity::Inverse))
                .collect(),
        )
    }

    pub fn with_rule(mut self, rule: PolarityRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[PolarityRule] {
        &self.rules
    }

    /// Polarity of `name`; unmatched names are direct.
    pub fn polarity(&self, name: &str) -> Polarity {
        let exact = self
            .rules
            .iter()
            .find(|r| r.kind == MatchKind::Exact && r.matches(name));

        exact
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|r| r.kind == MatchKind::Contains && r.matches(name))
            })
            .map(|r| r.polarity)
            .unwrap_or_default()
    }

    pub fn sign(&self, name: &str) -> f64 {
        self.polarity(name).multiplier()
    }

    /// Apply the table to a z-score cross-section.
    ///
    /// Takes the unadjusted [`CrossSection`] and returns a distinct type, so
    /// a pass can only ever invert once.
    pub fn adjust(&self, cross_section: &CrossSection) -> AdjustedCrossSection {
        let mut inverted = BTreeSet::new();
        let values = cross_section
            .values
            .iter()
            .map(|(name, z)| {
                let polarity = self.polarity(name);
                if polarity == Polarity::Inverse {
                    inverted.insert(name.clone());
                }
                let value = z * polarity.multiplier();
                // Keep zero unsigned so an inverted 0.0 ties with a direct one.
                (name.clone(), if value == 0.0 { 0.0 } else { value })
            })
            .collect();

        AdjustedCrossSection {
            as_of: cross_section.as_of,
            values,
            inverted,
        }
    }
}

/// Polarity-adjusted z-scores at one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustedCrossSection {
    pub as_of: Option<NaiveDate>,
    values: BTreeMap<String, f64>,
    inverted: BTreeSet<String>,
}

impl AdjustedCrossSection {
    /// Build from values that are already growth-positive.
    pub fn from_adjusted(as_of: Option<NaiveDate>, values: BTreeMap<String, f64>) -> Self {
        Self {
            as_of,
            values,
            inverted: BTreeSet::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    /// Whether `name` was sign-flipped in this pass.
    pub fn is_inverted(&self, name: &str) -> bool {
        self.inverted.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_section(pairs: &[(&str, f64)]) -> CrossSection {
        CrossSection {
            as_of: NaiveDate::from_ymd_opt(2024, 6, 30),
            values: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_unlisted_indicators_are_direct() {
        let table = PolarityTable::inverse_containing(&["Claims", "Spreads"]);
        assert_eq!(table.polarity("Consumer Sentiment"), Polarity::Direct);
        assert_eq!(table.sign("Housing Permits"), 1.0);
        assert_eq!(PolarityTable::default().sign("Jobless Claims"), 1.0);
    }

    #[test]
    fn test_substring_match_inverts() {
        let table = PolarityTable::inverse_containing(&["Claims", "Spreads"]);
        assert_eq!(table.polarity("Jobless Claims"), Polarity::Inverse);
        assert_eq!(table.polarity("High Yield Spreads"), Polarity::Inverse);
        assert_eq!(table.polarity("Credit Spreads"), Polarity::Inverse);
        // Substring matching is case sensitive.
        assert_eq!(table.polarity("jobless claims"), Polarity::Direct);
    }

    #[test]
    fn test_exact_rule_overrides_substring() {
        let table = PolarityTable::inverse_containing(&["Spread"])
            .with_rule(PolarityRule::exact("Lead-Lag Spread", Polarity::Direct));
        assert_eq!(table.polarity("Credit Spreads"), Polarity::Inverse);
        assert_eq!(table.polarity("Lead-Lag Spread"), Polarity::Direct);
    }

    #[test]
    fn test_adjust_flips_only_inverse() {
        let table = PolarityTable::inverse_containing(&["Claims"]);
        let cs = cross_section(&[("Jobless Claims", 1.5), ("Capacity Utilization", 0.7)]);

        let adjusted = table.adjust(&cs);
        assert_eq!(adjusted.as_of, cs.as_of);
        assert_eq!(adjusted.get("Jobless Claims"), Some(-1.5));
        assert_eq!(adjusted.get("Capacity Utilization"), Some(0.7));
        assert!(adjusted.is_inverted("Jobless Claims"));
        assert!(!adjusted.is_inverted("Capacity Utilization"));
    }

    #[test]
    fn test_inverted_zero_stays_unsigned() {
        let table = PolarityTable::inverse_containing(&["Claims"]);
        let adjusted = table.adjust(&cross_section(&[("Jobless Claims", 0.0)]));

        let value = adjusted.get("Jobless Claims").unwrap();
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
        assert!(adjusted.is_inverted("Jobless Claims"));
    }

    #[test]
    fn test_adjust_is_deterministic_and_not_cumulative() {
        let table = PolarityTable::inverse_containing(&["Claims"]);
        let cs = cross_section(&[("Jobless Claims", 2.0), ("Money Supply", -0.4)]);

        // Re-running the pass on the same snapshot (a refresh) never
        // compounds the sign flip.
        let first = table.adjust(&cs);
        let second = table.adjust(&cs);
        assert_eq!(first, second);
        assert_eq!(second.get("Jobless Claims"), Some(-2.0));
    }

    #[test]
    fn test_rule_deserialization_defaults() {
        #[derive(Deserialize)]
        struct Wrapper {
            polarity: PolarityTable,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
            [[polarity]]
            pattern = "Claims"

            [[polarity]]
            pattern = "USD Index"
            match = "exact"
            polarity = "direct"
            "#,
        )
        .unwrap();

        let rules = parsed.polarity.rules();
        assert_eq!(rules[0], PolarityRule::contains("Claims", Polarity::Inverse));
        assert_eq!(rules[1], PolarityRule::exact("USD Index", Polarity::Direct));
    }
}
