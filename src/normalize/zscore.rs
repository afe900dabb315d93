//! Rolling z-score normalizer.
//!
//! z[i] = (x[i] - mean(x[i-W+1..=i])) / stddev(x[i-W+1..=i]) with the sample
//! (n - 1) standard deviation. A period is missing when the window is not
//! yet full, holds a missing reading, or has no variance.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::IndicatorSet;

/// Default lookback: three years of monthly readings.
pub const DEFAULT_WINDOW: usize = 36;

/// Z-scores for one indicator, one slot per period of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl ZScoreSeries {
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Cross-section of z-scores at one period, missing entries dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub as_of: Option<NaiveDate>,
    pub values: BTreeMap<String, f64>,
}

impl CrossSection {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Z-score series for every indicator on the source grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSet {
    window: usize,
    periods: Vec<NaiveDate>,
    series: BTreeMap<String, ZScoreSeries>,
}

impl NormalizedSet {
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn get(&self, name: &str) -> Option<&ZScoreSeries> {
        self.series.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZScoreSeries> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Cross-section at the last period of the grid.
    pub fn latest(&self) -> CrossSection {
        match self.periods.len() {
            0 => CrossSection::default(),
            n => self.at(n - 1),
        }
    }

    /// Cross-section at period `index`; empty when out of range.
    pub fn at(&self, index: usize) -> CrossSection {
        let Some(as_of) = self.periods.get(index).copied() else {
            return CrossSection::default();
        };

        let values = self
            .series
            .iter()
            .filter_map(|(name, s)| s.values.get(index).copied().flatten().map(|z| (name.clone(), z)))
            .collect();

        CrossSection {
            as_of: Some(as_of),
            values,
        }
    }
}

/// Rolling z-score normalizer.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    window: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Normalizer {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Normalize every series of the set.
    pub fn normalize(&self, set: &IndicatorSet) -> NormalizedSet {
        let aligned: Vec<_> = set.iter().collect();

        let series: BTreeMap<String, ZScoreSeries> = aligned
            .par_iter()
            .map(|s| {
                let values = rolling_zscore(&s.values, self.window);
                (
                    s.name.clone(),
                    ZScoreSeries {
                        name: s.name.clone(),
                        values,
                    },
                )
            })
            .collect();

        for s in series.values() {
            if s.latest().is_none() {
                debug!(indicator = %s.name, window = self.window, "no z-score at latest period");
            }
        }

        NormalizedSet {
            window: self.window,
            periods: set.periods().to_vec(),
            series,
        }
    }
}

/// Rolling z-score over a trailing window of `window` readings.
pub fn rolling_zscore(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let trailing = &values[i + 1 - window..=i];
            let readings: Option<Vec<f64>> = trailing.iter().copied().collect();
            let readings = readings?;
            let (mean, std_dev) = window_stats(&readings)?;
            Some((readings[readings.len() - 1] - mean) / std_dev)
        })
        .collect()
}

/// Mean and sample standard deviation; `None` for a flat window.
fn window_stats(readings: &[f64]) -> Option<(f64, f64)> {
    let n = readings.len();
    if n < 2 {
        return None;
    }

    // Identical readings have zero spread; rounding in the mean must not
    // turn them into a tiny nonzero deviation.
    let first = readings[0];
    if readings.iter().all(|x| *x == first) {
        return None;
    }

    let mean = readings.iter().sum::<f64>() / n as f64;
    let variance = readings.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();

    if !std_dev.is_finite() || std_dev == 0.0 {
        return None;
    }

    Some((mean, std_dev))
}
