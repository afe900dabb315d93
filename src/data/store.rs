//! Indicator series store.
//!
//! Turns a raw basket of irregular readings into an [`IndicatorSet`] on a
//! regular month-end grid:
//! - readings are bucketed to their calendar month, the last one wins
//! - the grid spans the union of all available history
//! - gaps are filled with the last observation carried forward
//! - failed or empty sources are omitted, never fatal

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::types::{
    month_end, next_month_end, AlignedSeries, IndicatorSeries, IndicatorSet, Observation, RawBasket,
    SourceError,
};

/// Holds one monthly series per indicator for a single refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct IndicatorStore {
    series: BTreeMap<String, IndicatorSeries>,
    omitted: BTreeMap<String, SourceError>,
}

impl IndicatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a raw basket, tolerating per-series failures.
    pub fn ingest(raw: RawBasket) -> Self {
        let mut store = Self::new();

        for (name, source) in raw {
            match source {
                Ok(observations) => store.add_raw(name, observations),
                Err(err) => {
                    warn!(indicator = %name, error = %err, "omitting unavailable indicator");
                    store.omitted.insert(name, err);
                }
            }
        }

        info!(
            indicators = store.series.len(),
            omitted = store.omitted.len(),
            "ingested raw basket"
        );
        store
    }

    /// Resample raw readings to month-end and add them under `name`.
    pub fn add_raw(&mut self, name: String, observations: Vec<Observation>) {
        let monthly = resample_month_end(&name, observations);

        if monthly.is_empty() {
            warn!(indicator = %name, "omitting indicator with no finite readings");
            self.omitted.insert(name, SourceError::Empty);
            return;
        }

        match IndicatorSeries::new(name.clone(), monthly) {
            Ok(series) => {
                self.omitted.remove(&name);
                self.series.insert(name, series);
            }
            Err(err) => {
                warn!(indicator = %name, error = %err, "omitting malformed indicator");
                self.omitted.insert(name, SourceError::Malformed(err.to_string()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Indicators left out of the store and why.
    pub fn omitted(&self) -> &BTreeMap<String, SourceError> {
        &self.omitted
    }

    /// Align every series onto one month-end grid spanning all history.
    pub fn align(&self) -> IndicatorSet {
        let start = self.series.values().filter_map(|s| s.first_date()).min();
        let end = self.series.values().filter_map(|s| s.last_date()).max();

        let periods = match (start, end) {
            (Some(start), Some(end)) => month_grid(start, end),
            _ => return IndicatorSet::default(),
        };

        let aligned = self
            .series
            .values()
            .map(|series| forward_fill(series, &periods))
            .collect::<Vec<_>>();

        debug!(
            periods = periods.len(),
            indicators = aligned.len(),
            "aligned indicator set"
        );
        IndicatorSet::new(periods, aligned)
    }
}

/// A configured spread between two indicators, e.g. leading minus coincident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSpread {
    pub name: String,
    pub minuend: String,
    pub subtrahend: String,
}

impl DerivedSpread {
    pub fn new(name: &str, minuend: &str, subtrahend: &str) -> Self {
        Self {
            name: name.to_string(),
            minuend: minuend.to_string(),
            subtrahend: subtrahend.to_string(),
        }
    }

    /// Add `minuend - subtrahend` to the set. Returns false when an input is
    /// absent and the spread was not added.
    pub fn apply(&self, set: &mut IndicatorSet) -> bool {
        let (a, b) = match (set.get(&self.minuend), set.get(&self.subtrahend)) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                warn!(
                    spread = %self.name,
                    minuend = %self.minuend,
                    subtrahend = %self.subtrahend,
                    "omitting derived spread with missing input"
                );
                return false;
            }
        };

        let values = a
            .values
            .iter()
            .zip(&b.values)
            .map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) => Some(x - y),
                _ => None,
            })
            .collect();

        let spread = AlignedSeries {
            name: self.name.clone(),
            values,
            trailing_fill: a.trailing_fill.max(b.trailing_fill),
            first_reading: a.first_reading.max(b.first_reading),
            last_reading: a.last_reading.min(b.last_reading),
        };
        set.insert(spread)
    }
}

/// Bucket readings to month-end, keeping the last finite reading per month.
fn resample_month_end(name: &str, mut observations: Vec<Observation>) -> Vec<Observation> {
    let before = observations.len();
    observations.retain(|o| o.value.is_finite());
    if observations.len() < before {
        debug!(
            indicator = %name,
            dropped = before - observations.len(),
            "dropped non-finite readings"
        );
    }

    observations.sort_by_key(|o| o.date);

    let mut monthly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for obs in observations {
        monthly.insert(month_end(obs.date), obs.value);
    }

    monthly
        .into_iter()
        .map(|(date, value)| Observation::new(date, value))
        .collect()
}

/// Month-end dates from `start`'s month through `end`'s month inclusive.
fn month_grid(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let last = month_end(end);
    let mut periods = Vec::new();
    let mut current = month_end(start);

    while current <= last {
        periods.push(current);
        current = next_month_end(current);
    }
    periods
}

fn forward_fill(series: &IndicatorSeries, periods: &[NaiveDate]) -> AlignedSeries {
    let observations = series.observations();
    let mut values = Vec::with_capacity(periods.len());
    let mut next = 0;
    let mut current = None;

    for period in periods {
        if next < observations.len() && observations[next].date == *period {
            current = Some(observations[next].value);
            next += 1;
        }
        values.push(current);
    }

    let trailing_fill = series
        .last_date()
        .map(|last| periods.iter().filter(|p| **p > last).count())
        .unwrap_or(0);

    AlignedSeries {
        name: series.name().to_string(),
        values,
        trailing_fill,
        first_reading: series.first_date(),
        last_reading: series.last_date(),
    }
}
