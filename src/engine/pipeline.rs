//! Regime scoring pipeline.
//!
//! Store -> Normalizer -> Polarity -> Aggregator -> Classifier / Scorecard.
//! Every call works on its own immutable [`IndicatorSet`]; the engine holds
//! configuration only, so one engine can serve concurrent callers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::{ConfigError, EngineConfig};
use crate::data::{CsvLoader, IndicatorSet, IndicatorStore, RawBasket};
use crate::normalize::{NormalizedSet, Normalizer};
use crate::regime::{
    regime_stats, AdjustedCrossSection, Aggregate, Aggregator, PolarityTable, Regime,
    RegimeClassifier, RegimeStats, RegimeVerdict,
};
use crate::scorecard::{Scorecard, ScorecardBuilder};
use crate::validation::{DataIntegrityValidator, ValidationReport};

/// Everything one evaluation produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeReport {
    pub verdict: RegimeVerdict,
    pub scorecard: Scorecard,
    pub aggregate: Aggregate,
    pub cross_section: AdjustedCrossSection,
    pub normalized: NormalizedSet,
}

/// Growth/inflation position at one period, for charting the regime path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisPoint {
    pub date: NaiveDate,
    pub growth_axis: Option<f64>,
    pub inflation_axis: Option<f64>,
    pub composite: Option<f64>,
    pub regime: Regime,
}

/// Configured regime scoring engine.
#[derive(Debug, Clone)]
pub struct RegimeEngine {
    config: EngineConfig,
    normalizer: Normalizer,
    polarity: PolarityTable,
    aggregator: Aggregator,
    classifier: RegimeClassifier,
    scorecard: ScorecardBuilder,
}

impl RegimeEngine {
    /// Build an engine. Fails only on configuration mistakes.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            normalizer: Normalizer::new(config.window),
            polarity: config.polarity.clone(),
            aggregator: Aggregator::new(config.growth_axis.clone(), config.inflation_axis.clone()),
            classifier: RegimeClassifier::new(config.classifier_config()),
            scorecard: ScorecardBuilder::new(config.thresholds),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// CSV loader that renames source ids to the configured display names.
    pub fn loader(&self) -> CsvLoader {
        CsvLoader::new().with_aliases(self.config.aliases())
    }

    /// Align a raw basket, add derived spreads and keep basket members.
    pub fn ingest(&self, raw: RawBasket) -> IndicatorSet {
        self.ingest_store(IndicatorStore::ingest(raw))
    }

    fn ingest_store(&self, store: IndicatorStore) -> IndicatorSet {
        let mut set = store.align();
        for spread in &self.config.derived {
            spread.apply(&mut set);
        }

        let basket = self.config.basket();
        for name in set.names() {
            if !basket.contains(&name) {
                debug!(indicator = %name, "ignoring indicator outside the basket");
            }
        }
        for name in &basket {
            if !set.contains(name) {
                warn!(indicator = %name, "basket indicator missing from data");
            }
        }

        let set = set.retain_names(basket);
        for series in set.iter() {
            if series.trailing_fill > self.config.stale_after {
                warn!(
                    indicator = %series.name,
                    periods = series.trailing_fill,
                    last_reading = ?series.last_reading,
                    "indicator is stale, carrying last reading forward"
                );
            }
        }
        set
    }

    /// Run the full pipeline on one snapshot.
    pub fn evaluate(&self, set: &IndicatorSet) -> RegimeReport {
        let set = set.retain_names(self.config.basket());
        let normalized = self.normalizer.normalize(&set);
        let cross_section = self.polarity.adjust(&normalized.latest());
        let aggregate = self.aggregator.aggregate(&cross_section);
        let verdict = self.classifier.classify(&aggregate);
        let scorecard = self.scorecard.build(&cross_section);

        if aggregate.is_insufficient() {
            warn!(
                indicators = set.len(),
                window = self.config.window,
                "no indicator has a z-score at the latest period"
            );
        }

        info!(
            as_of = ?verdict.as_of,
            regime = %verdict.label,
            composite = ?verdict.composite_score,
            indicators = verdict.indicators_used,
            "evaluated macro regime"
        );

        RegimeReport {
            verdict,
            scorecard,
            aggregate,
            cross_section,
            normalized,
        }
    }

    /// Ingest then evaluate.
    pub fn evaluate_raw(&self, raw: RawBasket) -> RegimeReport {
        let set = self.ingest(raw);
        self.evaluate(&set)
    }

    /// Polarity-adjusted cross-section at period `index`.
    pub fn cross_section_at(&self, normalized: &NormalizedSet, index: usize) -> AdjustedCrossSection {
        self.polarity.adjust(&normalized.at(index))
    }

    /// Growth/inflation path over the trailing `periods` periods, oldest first.
    pub fn axis_path(&self, normalized: &NormalizedSet, periods: usize) -> Vec<AxisPoint> {
        let dates = normalized.periods();
        let start = dates.len().saturating_sub(periods);

        (start..dates.len())
            .map(|index| {
                let aggregate = self.aggregator.aggregate(&self.cross_section_at(normalized, index));
                AxisPoint {
                    date: dates[index],
                    growth_axis: aggregate.growth_axis,
                    inflation_axis: aggregate.inflation_axis,
                    composite: aggregate.composite,
                    regime: RegimeClassifier::classify_quadrant(aggregate.growth_axis, aggregate.inflation_axis),
                }
            })
            .collect()
    }

    /// Periods spent in each regime along a path.
    pub fn path_stats(path: &[AxisPoint]) -> Vec<RegimeStats> {
        regime_stats(path.iter().map(|p| p.regime)).into_values().collect()
    }

    /// Data integrity report for a raw basket. Informational only.
    pub fn check(&self, raw: RawBasket) -> ValidationReport {
        let store = IndicatorStore::ingest(raw);
        let omitted = store.omitted().clone();
        let set = self.ingest_store(store);

        DataIntegrityValidator::new(self.config.window, self.config.stale_after)
            .with_required(self.config.basket())
            .validate(&set, &omitted)
    }
}
