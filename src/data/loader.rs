//! CSV loader for indicator readings.
//!
//! Reads the layouts produced by macro data portals such as FRED:
//! - a wide file with a date column first and one column per source id
//! - a directory holding one such file per source
//!
//! Missing-value placeholders (`.` or empty cells) become gaps. A column or
//! file that cannot be read becomes a [`SourceError`] entry in the returned
//! [`RawBasket`] instead of failing the whole load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{Observation, RawBasket, SourceError};

/// Date formats accepted in the date column.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loads raw indicator readings from CSV files.
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    /// Source id -> display name.
    aliases: BTreeMap<String, String>,
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename source ids (e.g. `IC4WSA`) to display names (e.g. `Jobless Claims`).
    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Load a wide CSV file or a directory of CSV files.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<RawBasket, LoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }

        if path.is_dir() {
            self.load_directory(path)
        } else {
            self.load_wide(path)
        }
    }

    /// Load one wide CSV file.
    pub fn load_wide(&self, path: impl AsRef<Path>) -> Result<RawBasket, LoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }

        let df = read_csv(path)?;
        let basket = self.frame_to_basket(&df)?;

        info!(
            file = %path.display(),
            rows = df.height(),
            indicators = basket.len(),
            "loaded indicator file"
        );
        Ok(basket)
    }

    /// Load every `*.csv` file in a directory and merge the results.
    ///
    /// A file that fails to load is recorded under its file stem as an
    /// unavailable source.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<RawBasket, LoaderError> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                files.push(path);
            }
        }
        files.sort();

        let mut basket = RawBasket::new();
        for file in files {
            match self.load_wide(&file) {
                Ok(loaded) => basket.extend(loaded),
                Err(err) => {
                    let stem = file
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_else(|| file.display().to_string());
                    warn!(file = %file.display(), error = %err, "failed to load indicator file");
                    basket.insert(self.display_name(&stem), Err(SourceError::Unavailable(err.to_string())));
                }
            }
        }

        Ok(basket)
    }

    /// Convert a frame whose first column is the date into raw series.
    pub fn frame_to_basket(&self, df: &DataFrame) -> Result<RawBasket, LoaderError> {
        let columns = df.get_columns();
        let (date_col, value_cols) = columns
            .split_first()
            .ok_or_else(|| LoaderError::InvalidData("CSV has no columns".to_string()))?;

        let dates = parse_dates(date_col)?;
        let mut basket = RawBasket::new();

        for column in value_cols {
            let source_id = column.name().to_string();
            let name = self.display_name(&source_id);
            let series = column_observations(&dates, column);

            if let Ok(observations) = &series {
                debug!(indicator = %name, source = %source_id, readings = observations.len(), "parsed column");
            }
            basket.insert(name, series);
        }

        Ok(basket)
    }

    fn display_name(&self, source_id: &str) -> String {
        self.aliases
            .get(source_id)
            .cloned()
            .unwrap_or_else(|| source_id.to_string())
    }
}

fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    let parse_options =
        CsvParseOptions::default().with_null_values(Some(NullValues::AllColumnsSingle(".".into())));

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Parse the date column, keeping row positions (`None` for unparseable rows).
fn parse_dates(column: &Column) -> Result<Vec<Option<NaiveDate>>, LoaderError> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::String => {
            let str_col = series.str()?;
            Ok(str_col.into_iter().map(|s| s.and_then(parse_date)).collect())
        }
        DataType::Date => {
            let days = series.cast(&DataType::Int32)?;
            Ok(days.i32()?.into_iter().map(|d| d.map(date_from_days)).collect())
        }
        _ => Err(LoaderError::InvalidData(format!(
            "date column '{}' has unexpected type {}",
            column.name(),
            column.dtype()
        ))),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Convert days since Unix epoch to NaiveDate.
fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::from_num_days_from_ce_opt(days + 719163).unwrap_or_default()
}

fn column_observations(
    dates: &[Option<NaiveDate>],
    column: &Column,
) -> Result<Vec<Observation>, SourceError> {
    let values = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| SourceError::Malformed(e.to_string()))?;
    let values = values
        .f64()
        .map_err(|e| SourceError::Malformed(e.to_string()))?;

    let observations: Vec<Observation> = dates
        .iter()
        .zip(values.into_iter())
        .filter_map(|(date, value)| match (date, value) {
            (Some(date), Some(value)) if value.is_finite() => Some(Observation::new(*date, value)),
            _ => None,
        })
        .collect();

    if observations.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-31"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("2024/01/31"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("01/31/2024"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_date_from_days() {
        assert_eq!(date_from_days(0), d(1970, 1, 1));
        assert_eq!(date_from_days(19723), d(2024, 1, 1));
    }

    #[test]
    fn test_load_wide_with_placeholders_and_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "fred.csv",
            "observation_date,IC4WSA,T10YIE\n\
             2024-01-01,210.5,2.31\n\
             2024-02-01,.,2.40\n\
             2024-03-01,225.0,.\n",
        );

        let mut aliases = BTreeMap::new();
        aliases.insert("IC4WSA".to_string(), "Jobless Claims".to_string());
        let loader = CsvLoader::new().with_aliases(aliases);

        let basket = loader.load(&path).unwrap();
        assert_eq!(basket.len(), 2);

        let claims = basket.get("Jobless Claims").unwrap().as_ref().unwrap();
        assert_eq!(
            claims,
            &vec![
                Observation::new(d(2024, 1, 1), 210.5),
                Observation::new(d(2024, 3, 1), 225.0)
            ]
        );

        let breakevens = basket.get("T10YIE").unwrap().as_ref().unwrap();
        assert_eq!(breakevens.len(), 2);
    }

    #[test]
    fn test_all_missing_column_is_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "fred.csv",
            "DATE,GOOD,BAD\n2024-01-01,1.0,.\n2024-02-01,2.0,.\n",
        );

        let basket = CsvLoader::new().load(&path).unwrap();
        assert!(basket.get("GOOD").unwrap().is_ok());
        assert_eq!(basket.get("BAD").unwrap(), &Err(SourceError::Empty));
    }

    #[test]
    fn test_load_directory_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "M2SL.csv", "observation_date,M2SL\n2024-01-01,20800.1\n");
        write_file(dir.path(), "PERMIT.csv", "observation_date,PERMIT\n2024-01-01,1489\n");
        write_file(dir.path(), "notes.txt", "ignored");

        let basket = CsvLoader::new().load(dir.path()).unwrap();
        assert_eq!(basket.len(), 2);
        assert!(basket.contains_key("M2SL"));
        assert!(basket.contains_key("PERMIT"));
    }

    #[test]
    fn test_missing_file() {
        let result = CsvLoader::new().load("/definitely/not/here.csv");
        assert!(matches!(result, Err(LoaderError::FileNotFound(_))));
    }
}
