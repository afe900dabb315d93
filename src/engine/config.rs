//! Engine configuration.
//!
//! Everything that differs between dashboards (basket, inversion list,
//! thresholds, styles) is data here, loaded from TOML or built in code.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DerivedSpread;
use crate::normalize::DEFAULT_WINDOW;
use crate::regime::{ClassificationMode, PolarityTable, RegimeClassifierConfig, StyleTable, TierThresholds};

/// Trailing forward-filled periods tolerated before a series counts as stale.
pub const DEFAULT_STALE_AFTER: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Window must be at least 2 periods, got {0}")]
    InvalidWindow(usize),

    #[error("Indicator basket is empty")]
    EmptyBasket,

    #[error("Duplicate indicator name: {0}")]
    DuplicateIndicator(String),

    #[error("{axis} axis indicator '{name}' is not in the basket")]
    UnknownAxisIndicator { axis: &'static str, name: String },

    #[error("Derived spread '{spread}' references unknown indicator '{name}'")]
    UnknownSpreadInput { spread: String, name: String },

    #[error("Tier thresholds must be strictly increasing: {0:?}")]
    InvalidThresholds(TierThresholds),
}

/// A basket member: provider source id and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorDef {
    pub id: String,
    pub name: String,
}

impl IndicatorDef {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_stale_after() -> usize {
    DEFAULT_STALE_AFTER
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rolling z-score lookback in monthly periods.
    #[serde(default = "default_window")]
    pub window: usize,
    pub growth_axis: String,
    pub inflation_axis: String,
    #[serde(default)]
    pub classification: ClassificationMode,
    #[serde(default = "default_stale_after")]
    pub stale_after: usize,
    #[serde(default)]
    pub thresholds: TierThresholds,
    #[serde(default)]
    pub styles: StyleTable,
    #[serde(default)]
    pub indicators: Vec<IndicatorDef>,
    #[serde(default)]
    pub derived: Vec<DerivedSpread>,
    #[serde(default)]
    pub polarity: PolarityTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let indicators = vec![
            IndicatorDef::new("USSLIND", "Leading Index (PMI Proxy)"),
            IndicatorDef::new("USPHCI", "Coincident Index (Services Proxy)"),
            IndicatorDef::new("IC4WSA", "Jobless Claims"),
            IndicatorDef::new("MCUMFN", "Capacity Utilization"),
            IndicatorDef::new("BAA10Y", "Credit Spreads"),
            IndicatorDef::new("BAMLH0A0HYM2", "High Yield Spreads"),
            IndicatorDef::new("UMCSENT", "Consumer Sentiment"),
            IndicatorDef::new("T10Y2Y", "Yield Curve"),
            IndicatorDef::new("DTWEXBGS", "USD Index"),
            IndicatorDef::new("M2SL", "Money Supply"),
            IndicatorDef::new("TRUCKD11", "Truck Tonnage (Baltic Proxy)"),
            IndicatorDef::new("T10YIE", "Inflation Breakevens"),
            IndicatorDef::new("PERMIT", "Housing Permits"),
        ];

        Self {
            window: DEFAULT_WINDOW,
            growth_axis: "Leading Index (PMI Proxy)".to_string(),
            inflation_axis: "Inflation Breakevens".to_string(),
            classification: ClassificationMode::Quadrant,
            stale_after: DEFAULT_STALE_AFTER,
            thresholds: TierThresholds::default(),
            styles: StyleTable::default(),
            indicators,
            derived: vec![DerivedSpread::new(
                "Lead-Lag Spread",
                "Leading Index (PMI Proxy)",
                "Coincident Index (Services Proxy)",
            )],
            polarity: PolarityTable::inverse_containing(&["Claims", "Spreads"]),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Names of every indicator the engine scores, derived spreads included.
    pub fn basket(&self) -> Vec<&str> {
        self.indicators
            .iter()
            .map(|i| i.name.as_str())
            .chain(self.derived.iter().map(|d| d.name.as_str()))
            .collect()
    }

    /// Source id -> display name.
    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.indicators
            .iter()
            .map(|i| (i.id.clone(), i.name.clone()))
            .collect()
    }

    pub fn classifier_config(&self) -> RegimeClassifierConfig {
        RegimeClassifierConfig {
            mode: self.classification,
            thresholds: self.thresholds,
            styles: self.styles.clone(),
        }
    }

    /// Check for configuration mistakes. These are fatal, unlike data gaps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::InvalidWindow(self.window));
        }

        if !self.thresholds.is_ordered() {
            return Err(ConfigError::InvalidThresholds(self.thresholds));
        }

        let basket = self.basket();
        if basket.is_empty() {
            return Err(ConfigError::EmptyBasket);
        }

        let mut seen = BTreeSet::new();
        for name in &basket {
            if !seen.insert(*name) {
                return Err(ConfigError::DuplicateIndicator(name.to_string()));
            }
        }

        for spread in &self.derived {
            for input in [&spread.minuend, &spread.subtrahend] {
                if !seen.contains(input.as_str()) || *input == spread.name {
                    return Err(ConfigError::UnknownSpreadInput {
                        spread: spread.name.clone(),
                        name: input.clone(),
                    });
                }
            }
        }

        for (axis, name) in [("growth", &self.growth_axis), ("inflation", &self.inflation_axis)] {
            if !seen.contains(name.as_str()) {
                return Err(ConfigError::UnknownAxisIndicator {
                    axis,
                    name: name.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::Polarity;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window, 36);
        assert_eq!(config.basket().len(), 14);
        assert!(config.basket().contains(&"Lead-Lag Spread"));
        assert_eq!(config.aliases().get("IC4WSA").map(String::as_str), Some("Jobless Claims"));
    }

    #[test]
    fn test_default_polarity() {
        let config = EngineConfig::default();
        assert_eq!(config.polarity.polarity("Jobless Claims"), Polarity::Inverse);
        assert_eq!(config.polarity.polarity("High Yield Spreads"), Polarity::Inverse);
        assert_eq!(config.polarity.polarity("USD Index"), Polarity::Direct);
        assert_eq!(config.polarity.polarity("Lead-Lag Spread"), Polarity::Direct);
    }

    #[test]
    fn test_unknown_axis_is_fatal() {
        let config = EngineConfig {
            growth_axis: "ISM Manufacturing".to_string(),
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(ConfigError::UnknownAxisIndicator { axis, name }) => {
                assert_eq!(axis, "growth");
                assert_eq!(name, "ISM Manufacturing");
            }
            other => panic!("expected UnknownAxisIndicator, got {:?}", other),
        }

        let config = EngineConfig {
            inflation_axis: "CPI".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownAxisIndicator { axis: "inflation", .. })
        ));
    }

    #[test]
    fn test_derived_spread_can_be_an_axis() {
        let config = EngineConfig {
            growth_axis: "Lead-Lag Spread".to_string(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let config = EngineConfig {
            window: 1,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWindow(1))));

        let config = EngineConfig {
            indicators: vec![],
            derived: vec![],
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyBasket)));

        let mut config = EngineConfig::default();
        config.indicators.push(IndicatorDef::new("ICSA", "Jobless Claims"));
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateIndicator(_))));

        let mut config = EngineConfig::default();
        config.derived.push(DerivedSpread::new("Bogus", "Yield Curve", "Nope"));
        assert!(matches!(config.validate(), Err(ConfigError::UnknownSpreadInput { .. })));

        let config = EngineConfig {
            thresholds: TierThresholds {
                strong_positive: -1.0,
                neutral: 0.0,
                strong_negative: 1.0,
            },
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThresholds(_))));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            growth_axis = "Leading Index"
            inflation_axis = "Breakevens"
            classification = "quadrant_with_fallback"

            [styles]
            contraction = "Treasuries"

            [[indicators]]
            id = "USSLIND"
            name = "Leading Index"

            [[indicators]]
            id = "T10YIE"
            name = "Breakevens"

            [[indicators]]
            id = "ICSA"
            name = "Initial Claims"

            [[polarity]]
            pattern = "Claims"
            "#,
        )
        .unwrap();

        assert_eq!(config.window, DEFAULT_WINDOW);
        assert_eq!(config.stale_after, DEFAULT_STALE_AFTER);
        assert_eq!(config.classification, ClassificationMode::QuadrantWithFallback);
        assert_eq!(config.styles.contraction, "Treasuries");
        assert_eq!(config.styles.expansion, StyleTable::default().expansion);
        assert_eq!(config.thresholds, TierThresholds::default());
        assert_eq!(config.polarity.polarity("Initial Claims"), Polarity::Inverse);
        assert!(config.derived.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_axis() {
        let result = EngineConfig::from_toml_str(
            r#"
            growth_axis = "Missing"
            inflation_axis = "Breakevens"

            [[indicators]]
            id = "T10YIE"
            name = "Breakevens"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::UnknownAxisIndicator { .. })));
    }

    #[test]
    fn test_toml_round_trip_of_default() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
