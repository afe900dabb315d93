//! Scorecard builder.
//!
//! Ranks the per-indicator contributions of an adjusted cross-section and
//! buckets each one with the same thresholds as the composite tiers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::regime::{AdjustedCrossSection, Tier, TierThresholds};

/// One ranked indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardEntry {
    pub indicator: String,
    /// Polarity-adjusted z-score.
    pub score: f64,
    pub tier: Tier,
    /// Whether the raw z-score was sign-flipped.
    pub inverted: bool,
}

/// Indicators ordered ascending by score, ties broken by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub as_of: Option<NaiveDate>,
    entries: Vec<ScorecardEntry>,
}

impl Scorecard {
    /// Entries in ascending order.
    pub fn entries(&self) -> &[ScorecardEntry] {
        &self.entries
    }

    /// Entries strongest first.
    pub fn descending(&self) -> impl Iterator<Item = &ScorecardEntry> {
        self.entries.iter().rev()
    }

    pub fn get(&self, indicator: &str) -> Option<&ScorecardEntry> {
        self.entries.iter().find(|e| e.indicator == indicator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in a positive bucket.
    pub fn net_bullish(&self) -> usize {
        self.entries.iter().filter(|e| e.tier.is_bullish()).count()
    }

    /// Plain-text table, strongest first.
    pub fn render(&self) -> String {
        let width = self
            .entries
            .iter()
            .map(|e| e.indicator.len())
            .max()
            .unwrap_or(0)
            .max("Indicator".len());

        let mut out = format!("{:<width$}  {:>8}  {}\n", "Indicator", "Z-Score", "Signal", width = width);
        for entry in self.descending() {
            let marker = if entry.inverted { " (inverted)" } else { "" };
            out.push_str(&format!(
                "{:<width$}  {:>8.2}  {}{}\n",
                entry.indicator,
                entry.score,
                entry.tier.signal(),
                marker,
                width = width
            ));
        }
        out.push_str(&format!("\nNet Bullish Signals: {} / {}", self.net_bullish(), self.len()));
        out
    }
}

/// Builds scorecards from adjusted cross-sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScorecardBuilder {
    thresholds: TierThresholds,
}

impl ScorecardBuilder {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn build(&self, cross_section: &AdjustedCrossSection) -> Scorecard {
        let mut entries: Vec<ScorecardEntry> = cross_section
            .iter()
            .map(|(name, score)| ScorecardEntry {
                indicator: name.to_string(),
                score,
                tier: self.thresholds.tier(score),
                inverted: cross_section.is_inverted(name),
            })
            .collect();

        entries.sort_by(|a, b| {
            if a.score == b.score {
                a.indicator.cmp(&b.indicator)
            } else {
                a.score.total_cmp(&b.score)
            }
        });

        Scorecard {
            as_of: cross_section.as_of,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn adjusted(pairs: &[(&str, f64)]) -> AdjustedCrossSection {
        let values: BTreeMap<String, f64> = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        AdjustedCrossSection::from_adjusted(NaiveDate::from_ymd_opt(2024, 6, 30), values)
    }

    fn names(card: &Scorecard) -> Vec<&str> {
        card.entries().iter().map(|e| e.indicator.as_str()).collect()
    }

    #[test]
    fn test_ascending_order_and_buckets() {
        let card = ScorecardBuilder::default().build(&adjusted(&[("C", 1.3), ("A", -2.0), ("B", 0.5)]));

        assert_eq!(names(&card), vec!["A", "B", "C"]);
        assert_eq!(card.get("A").unwrap().tier.bucket_label(), "strong negative");
        assert_eq!(card.get("B").unwrap().tier.bucket_label(), "mild positive");
        assert_eq!(card.get("C").unwrap().tier.bucket_label(), "strong positive");
    }

    #[test]
    fn test_ties_break_by_name() {
        let card = ScorecardBuilder::default().build(&adjusted(&[("Zeta", 0.5), ("Alpha", 0.5), ("Mid", -0.1)]));
        assert_eq!(names(&card), vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_inverted_zero_ties_with_direct_zero() {
        let table = crate::regime::PolarityTable::inverse_containing(&["Claims"]);
        let cs = crate::normalize::CrossSection {
            as_of: NaiveDate::from_ymd_opt(2024, 6, 30),
            values: [("Alpha", 0.0), ("Zeta Claims", 0.0)]
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        };

        let card = ScorecardBuilder::default().build(&table.adjust(&cs));
        assert_eq!(names(&card), vec!["Alpha", "Zeta Claims"]);
        assert!(card.get("Zeta Claims").unwrap().inverted);
        assert!(!card.render().contains("-0.00"));

        // Signed zeros handed in directly still tie.
        let card = ScorecardBuilder::default().build(&adjusted(&[("Zeta", -0.0), ("Alpha", 0.0)]));
        assert_eq!(names(&card), vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_descending_and_net_bullish() {
        let card = ScorecardBuilder::default().build(&adjusted(&[("A", -2.0), ("B", 0.5), ("C", 1.3), ("D", 0.0)]));
        let desc: Vec<&str> = card.descending().map(|e| e.indicator.as_str()).collect();
        assert_eq!(desc, vec!["C", "B", "D", "A"]);
        // Zero sits in the mild negative bucket.
        assert_eq!(card.get("D").unwrap().tier, Tier::MildNegative);
        assert_eq!(card.net_bullish(), 2);
    }

    #[test]
    fn test_render() {
        let card = ScorecardBuilder::default().build(&adjusted(&[("Credit Spreads", -1.5), ("Permits", 0.4)]));
        let text = card.render();
        assert!(text.starts_with("Indicator"));
        assert!(text.contains("-- Contraction"));
        assert!(text.contains("+ Recovery"));
        assert!(text.ends_with("Net Bullish Signals: 1 / 2"));
    }

    #[test]
    fn test_empty_cross_section() {
        let card = ScorecardBuilder::default().build(&adjusted(&[]));
        assert!(card.is_empty());
        assert_eq!(card.net_bullish(), 0);
    }
}
