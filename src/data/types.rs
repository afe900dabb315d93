//! Core data types for indicator ingestion.
//!
//! Raw readings arrive as [`Observation`]s keyed by indicator name. They are
//! validated into an [`IndicatorSeries`] and then aligned onto a shared
//! monthly grid as an [`IndicatorSet`].

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing an [`IndicatorSeries`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("{name}: observation dates must be strictly increasing ({previous} followed by {next})")]
    NotIncreasing {
        name: String,
        previous: NaiveDate,
        next: NaiveDate,
    },

    #[error("{name}: non-finite reading on {date}")]
    NonFinite { name: String, date: NaiveDate },
}

/// Why a raw source produced no series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("source returned no usable readings")]
    Empty,

    #[error("malformed source data: {0}")]
    Malformed(String),
}

/// A single dated reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Raw basket handed over by the data-provider collaborator.
///
/// Each entry is either the readings for that indicator or the reason the
/// source failed. A failed entry never aborts ingestion.
pub type RawBasket = BTreeMap<String, Result<Vec<Observation>, SourceError>>;

/// Validated time series for one indicator.
///
/// Dates are strictly increasing and every reading is finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    name: String,
    observations: Vec<Observation>,
}

impl IndicatorSeries {
    /// Build a series, rejecting duplicate or out-of-order dates and
    /// non-finite readings.
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Result<Self, SeriesError> {
        let name = name.into();

        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NotIncreasing {
                    name,
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(SeriesError::NonFinite {
                name,
                date: bad.date,
            });
        }

        Ok(Self { name, observations })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }
}

/// One indicator laid out on the shared period grid.
///
/// `values[i]` belongs to `IndicatorSet::periods()[i]`. `None` marks periods
/// before the first reading; later gaps are forward-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
    /// Number of trailing periods that carry a forward-filled value.
    pub trailing_fill: usize,
    /// Date of the last raw reading before alignment.
    pub last_reading: Option<NaiveDate>,
    /// Date of the first raw reading before alignment.
    pub first_reading: Option<NaiveDate>,
}

impl AlignedSeries {
    /// Number of periods that hold a value.
    pub fn present(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Value at the last period of the grid.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Indicators aligned on one monthly grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    periods: Vec<NaiveDate>,
    series: BTreeMap<String, AlignedSeries>,
}

impl IndicatorSet {
    /// Create a set from pre-aligned series.
    ///
    /// Every series must have exactly one slot per period; mismatched series
    /// are dropped.
    pub fn new(periods: Vec<NaiveDate>, series: impl IntoIterator<Item = AlignedSeries>) -> Self {
        let len = periods.len();
        let series = series
            .into_iter()
            .filter(|s| {
                let aligned = s.values.len() == len;
                if !aligned {
                    tracing::warn!(
                        indicator = %s.name,
                        expected = len,
                        actual = s.values.len(),
                        "dropping series that does not match the period grid"
                    );
                }
                aligned
            })
            .map(|s| (s.name.clone(), s))
            .collect();

        Self { periods, series }
    }

    /// Month-end dates of the grid, oldest first.
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.periods.last().copied()
    }

    pub fn get(&self, name: &str) -> Option<&AlignedSeries> {
        self.series.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlignedSeries> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Add or replace a series. Ignored if its length does not match the grid.
    pub fn insert(&mut self, series: AlignedSeries) -> bool {
        if series.values.len() != self.periods.len() {
            return false;
        }
        self.series.insert(series.name.clone(), series);
        true
    }

    /// Keep only the named indicators.
    pub fn retain_names<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut series = BTreeMap::new();
        for name in names {
            if let Some(s) = self.series.get(name) {
                series.insert(name.to_string(), s.clone());
            }
        }
        Self {
            periods: self.periods.clone(),
            series,
        }
    }
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Month end following `date`'s month.
pub fn next_month_end(date: NaiveDate) -> NaiveDate {
    let end = month_end(date);
    end.succ_opt().map(month_end).unwrap_or(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let obs = vec![Observation::new(d(2024, 1, 31), 1.0), Observation::new(d(2024, 1, 31), 2.0)];
        let err = IndicatorSeries::new("Claims", obs).unwrap_err();
        assert!(matches!(err, SeriesError::NotIncreasing { .. }));
    }

    #[test]
    fn test_series_rejects_non_finite() {
        let obs = vec![Observation::new(d(2024, 1, 31), f64::NAN)];
        let err = IndicatorSeries::new("Claims", obs).unwrap_err();
        assert_eq!(
            err,
            SeriesError::NonFinite {
                name: "Claims".to_string(),
                date: d(2024, 1, 31)
            }
        );
    }

    #[test]
    fn test_series_accessors() {
        let obs = vec![Observation::new(d(2024, 1, 5), 1.0), Observation::new(d(2024, 3, 5), 2.0)];
        let series = IndicatorSeries::new("Permits", obs).unwrap();
        assert_eq!(series.name(), "Permits");
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(d(2024, 1, 5)));
        assert_eq!(series.last_date(), Some(d(2024, 3, 5)));
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(d(2024, 2, 10)), d(2024, 2, 29));
        assert_eq!(month_end(d(2023, 12, 1)), d(2023, 12, 31));
        assert_eq!(next_month_end(d(2023, 12, 31)), d(2024, 1, 31));
        assert_eq!(next_month_end(d(2024, 1, 15)), d(2024, 2, 29));
    }

    #[test]
    fn test_set_drops_misaligned_series() {
        let periods = vec![d(2024, 1, 31), d(2024, 2, 29)];
        let good = AlignedSeries {
            name: "A".to_string(),
            values: vec![Some(1.0), Some(2.0)],
            trailing_fill: 0,
            last_reading: Some(d(2024, 2, 29)),
            first_reading: Some(d(2024, 1, 31)),
        };
        let bad = AlignedSeries {
            name: "B".to_string(),
            values: vec![Some(1.0)],
            ..good.clone()
        };
        let set = IndicatorSet::new(periods, vec![good, bad]);
        assert_eq!(set.len(), 1);
        assert!(set.contains("A"));
        assert_eq!(set.get("A").unwrap().latest(), Some(2.0));
    }
}
