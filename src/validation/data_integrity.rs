//! Data integrity checks for an aligned indicator set.
//!
//! Validates:
//! - Sources (every raw series loaded)
//! - Coverage (every basket indicator present after alignment)
//! - History (enough periods for a full z-score window)
//! - Freshness (not carried forward for too many trailing periods)
//!
//! Failures are informational. Scoring tolerates all of them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{AlignedSeries, IndicatorSet, SourceError};

/// Result of a single validation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Complete integrity report for one indicator set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub periods: usize,
    pub as_of: Option<NaiveDate>,
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        let total = self.checks.len();
        format!(
            "{} periods through {}: {}/{} checks passed",
            self.periods,
            fmt_date(self.as_of),
            passed,
            total
        )
    }
}

/// Validator for aligned indicator data.
#[derive(Debug, Clone)]
pub struct DataIntegrityValidator {
    window: usize,
    stale_after: usize,
    required: Vec<String>,
}

impl DataIntegrityValidator {
    pub fn new(window: usize, stale_after: usize) -> Self {
        Self {
            window,
            stale_after,
            required: Vec::new(),
        }
    }

    /// Indicators that must be present after alignment.
    pub fn with_required<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.required = names.into_iter().map(str::to_string).collect();
        self
    }

    /// Run all checks.
    pub fn validate(&self, set: &IndicatorSet, omitted: &BTreeMap<String, SourceError>) -> ValidationReport {
        let mut checks = Vec::new();

        // 1. Sources
        for (name, err) in omitted {
            checks.push(CheckResult::fail(
                &format!("source:{}", name),
                "Source produced no series",
                Some(err.to_string()),
            ));
        }

        // 2. Coverage
        for name in &self.required {
            if !set.contains(name) && !omitted.contains_key(name) {
                checks.push(CheckResult::fail(
                    &format!("coverage:{}", name),
                    "Indicator missing from data",
                    None,
                ));
            }
        }

        // 3-4. Per-series history and freshness
        for series in set.iter() {
            checks.push(self.check_history(series));
            checks.push(self.check_freshness(series));
        }

        ValidationReport {
            periods: set.periods().len(),
            as_of: set.latest_period(),
            checks,
        }
    }

    fn check_history(&self, series: &AlignedSeries) -> CheckResult {
        let check = format!("history:{}", series.name);
        let present = series.present();
        let since = fmt_date(series.first_reading);
        if present >= self.window {
            CheckResult::pass(
                &check,
                &format!("{} periods since {}, window {}", present, since, self.window),
            )
        } else {
            CheckResult::fail(
                &check,
                "Not enough history for a z-score",
                Some(format!("{} periods since {}, window needs {}", present, since, self.window)),
            )
        }
    }

    fn check_freshness(&self, series: &AlignedSeries) -> CheckResult {
        let check = format!("freshness:{}", series.name);
        let last = fmt_date(series.last_reading);
        if series.trailing_fill <= self.stale_after {
            CheckResult::pass(&check, &format!("Last reading {}", last))
        } else {
            CheckResult::fail(
                &check,
                &format!("Stale for {} periods", series.trailing_fill),
                Some(format!("last reading {}", last)),
            )
        }
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn set() -> IndicatorSet {
        let periods = vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30)];
        let fresh = AlignedSeries {
            name: "Fresh".to_string(),
            values: vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            trailing_fill: 0,
            first_reading: Some(d(2024, 1, 31)),
            last_reading: Some(d(2024, 4, 30)),
        };
        let stale = AlignedSeries {
            name: "Stale".to_string(),
            values: vec![None, Some(2.0), Some(2.0), Some(2.0)],
            trailing_fill: 2,
            first_reading: Some(d(2024, 2, 29)),
            last_reading: Some(d(2024, 2, 29)),
        };
        IndicatorSet::new(periods, vec![fresh, stale])
    }

    #[test]
    fn test_check_result() {
        let pass = CheckResult::pass("test", "passed");
        assert!(pass.passed);

        let fail = CheckResult::fail("test", "failed", Some("details".to_string()));
        assert!(!fail.passed);
        assert_eq!(fail.details, Some("details".to_string()));
    }

    #[test]
    fn test_history_and_freshness() {
        let validator = DataIntegrityValidator::new(4, 1);
        let report = validator.validate(&set(), &BTreeMap::new());

        assert_eq!(report.periods, 4);
        assert_eq!(report.as_of, Some(d(2024, 4, 30)));

        let failed: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
        assert_eq!(failed, vec!["history:Stale", "freshness:Stale"]);
        assert!(report.summary().ends_with("2/4 checks passed"));
    }

    #[test]
    fn test_sources_and_coverage() {
        let mut omitted = BTreeMap::new();
        omitted.insert("Claims".to_string(), SourceError::Unavailable("timeout".to_string()));

        let validator = DataIntegrityValidator::new(3, 3).with_required(["Fresh", "Claims", "Permits"]);
        let report = validator.validate(&set(), &omitted);

        assert!(!report.all_passed());
        let failed: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
        assert!(failed.contains(&"source:Claims"));
        assert!(failed.contains(&"coverage:Permits"));
        // Omitted sources are not reported twice.
        assert!(!failed.contains(&"coverage:Claims"));
        assert!(!failed.contains(&"history:Fresh"));
    }
}
