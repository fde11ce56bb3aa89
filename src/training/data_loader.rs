use crate::features::config::FeatureConfig;
use crate::training::error::TrainingError;
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use polars::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

/// Field contents treated as "no observation" in the historical CSV.
const MISSING_TOKENS: [&str; 4] = ["NA", "NaN", "", " "];
const INFER_SCHEMA_ROWS: usize = 10_000;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of the derived calendar-month column added to the prepared frame.
pub(crate) const MONTH_COLUMN: &str = "__month";

/// The historical dataset after cleaning, ready for aggregation and training.
///
/// Rows without a parseable date or without a `Yes`/`No` target have been dropped.
/// `frame` holds exactly: the location column (String), every configured numeric
/// feature (Float64), every configured categorical feature (String) and
/// [`MONTH_COLUMN`] (Int32). Columns that were absent from the source are present
/// but entirely null.
#[derive(Debug, Clone)]
pub struct TrainingFrame {
    pub frame: DataFrame,
    pub dates: Vec<NaiveDate>,
    pub labels: Vec<bool>,
    /// Earliest parseable date of the raw data, before target filtering.
    pub reference_date: Option<NaiveDate>,
}

/// Reads a headered CSV file into a DataFrame in a blocking task.
pub async fn load_csv(path: &Path) -> Result<DataFrame, TrainingError> {
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || read_csv(path_buf)).await?
}

/// Parses headered CSV bytes into a DataFrame.
///
/// Polars reads from a file, so the bytes are spooled to a temporary file first.
pub async fn load_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame, TrainingError> {
    task::spawn_blocking(move || {
        let mut temp_file = NamedTempFile::new().map_err(TrainingError::TempFile)?;
        temp_file
            .write_all(&bytes)
            .map_err(TrainingError::TempFile)?;
        temp_file.flush().map_err(TrainingError::TempFile)?;
        read_csv(temp_file.path().to_path_buf())
    })
    .await?
}

fn read_csv(path: PathBuf) -> Result<DataFrame, TrainingError> {
    if let Err(e) = std::fs::metadata(&path) {
        return Err(TrainingError::CsvReadIo(path, e));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .map_parse_options(|opts| {
            opts.with_null_values(Some(NullValues::AllColumns(
                MISSING_TOKENS.iter().map(|token| (*token).into()).collect(),
            )))
        })
        .try_into_reader_with_file_path(Some(path.clone()))
        .map_err(|e| TrainingError::CsvReadPolars(path.clone(), e))?
        .finish()
        .map_err(|e| TrainingError::CsvReadPolars(path.clone(), e))?;
    info!(
        "Read {} rows and {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Tolerate timestamps by looking at the calendar part only.
    let day_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day_part, DATE_FORMAT).ok()
}

fn parse_label(raw: &str) -> Option<bool> {
    match raw.trim() {
        "Yes" => Some(true),
        "No" => Some(false),
        _ => None,
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

fn cast_column(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Column, TrainingError> {
    df.column(name)
        .map_err(|_| TrainingError::MissingColumn(name.to_string()))?
        .cast(dtype)
        .map_err(|source| TrainingError::ColumnConversion {
            column: name.to_string(),
            source,
        })
}

/// Reads a column as owned strings, converting other dtypes to their text form.
pub(crate) fn string_values(
    df: &DataFrame,
    name: &str,
) -> Result<Vec<Option<String>>, TrainingError> {
    let column = cast_column(df, name, &DataType::String)?;
    let values = column
        .str()
        .map_err(|source| TrainingError::ColumnConversion {
            column: name.to_string(),
            source,
        })?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

/// Reads a column as floats; text that is not a number becomes `None`.
pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TrainingError> {
    let column = cast_column(df, name, &DataType::Float64)?;
    let values = column
        .f64()
        .map_err(|source| TrainingError::ColumnConversion {
            column: name.to_string(),
            source,
        })?
        .into_iter()
        .collect();
    Ok(values)
}

impl TrainingFrame {
    /// Cleans a raw historical DataFrame according to `config`.
    ///
    /// # Errors
    ///
    /// * [`TrainingError::MissingColumn`] if the date, location or target column is absent.
    /// * [`TrainingError::NoUsableRows`] if filtering leaves nothing to train on.
    pub fn prepare(df: &DataFrame, config: &FeatureConfig) -> Result<Self, TrainingError> {
        for required in [
            &config.date_column,
            &config.location_column,
            &config.target_column,
        ] {
            if !has_column(df, required) {
                return Err(TrainingError::MissingColumn(required.clone()));
            }
        }

        let raw_dates: Vec<Option<NaiveDate>> = string_values(df, &config.date_column)?
            .iter()
            .map(|value| value.as_deref().and_then(parse_date))
            .collect();
        let reference_date = raw_dates.iter().flatten().min().copied();

        let raw_labels: Vec<Option<bool>> = string_values(df, &config.target_column)?
            .iter()
            .map(|value| value.as_deref().and_then(parse_label))
            .collect();

        let keep: Vec<bool> = raw_dates
            .iter()
            .zip(&raw_labels)
            .map(|(date, label)| date.is_some() && label.is_some())
            .collect();
        let unlabeled = raw_labels.iter().filter(|label| label.is_none()).count();
        let undated = raw_labels
            .iter()
            .zip(&raw_dates)
            .filter(|(label, date)| label.is_some() && date.is_none())
            .count();
        if unlabeled > 0 {
            info!(
                "Dropping {} rows whose '{}' is not Yes/No",
                unlabeled, config.target_column
            );
        }
        if undated > 0 {
            warn!(
                "Dropping {} labelled rows with an unparseable '{}'",
                undated, config.date_column
            );
        }

        let dates: Vec<NaiveDate> = raw_dates
            .iter()
            .zip(&keep)
            .filter_map(|(date, keep)| if *keep { *date } else { None })
            .collect();
        let labels: Vec<bool> = raw_labels
            .iter()
            .zip(&keep)
            .filter_map(|(label, keep)| if *keep { *label } else { None })
            .collect();
        if dates.is_empty() {
            return Err(TrainingError::NoUsableRows {
                target: config.target_column.clone(),
            });
        }

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let filtered = df.filter(&mask)?;
        let height = filtered.height();

        let mut columns: Vec<Column> =
            Vec::with_capacity(config.numeric.len() + config.categorical.len() + 2);
        columns.push(cast_column(
            &filtered,
            &config.location_column,
            &DataType::String,
        )?);
        for name in &config.numeric {
            if has_column(&filtered, name) {
                columns.push(cast_column(&filtered, name, &DataType::Float64)?);
            } else {
                warn!("Numeric feature '{}' not in training data, treating as missing", name);
                let nulls = Series::full_null(name.as_str().into(), height, &DataType::Float64);
                columns.push(nulls.into());
            }
        }
        for name in &config.categorical {
            if has_column(&filtered, name) {
                columns.push(cast_column(&filtered, name, &DataType::String)?);
            } else {
                warn!("Categorical feature '{}' not in training data, treating as missing", name);
                let nulls = Series::full_null(name.as_str().into(), height, &DataType::String);
                columns.push(nulls.into());
            }
        }
        let months: Vec<i32> = dates.iter().map(|date| date.month() as i32).collect();
        columns.push(Series::new(MONTH_COLUMN.into(), months).into());

        let frame = DataFrame::new(columns)?;
        Ok(Self {
            frame,
            dates,
            labels,
            reference_date,
        })
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn float_values(&self, name: &str) -> Result<Vec<Option<f64>>, TrainingError> {
        float_values(&self.frame, name)
    }

    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>, TrainingError> {
        string_values(&self.frame, name)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.dates.iter().min()?;
        let last = self.dates.iter().max()?;
        Some((*first, *last))
    }
}
