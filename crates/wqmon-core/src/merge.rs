use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use tracing::{info, warn};
use wqmon_parser::{parse_station_csv, ColumnNames, MeasurementRecord, Parameter, StationFile};

use crate::error::Result;

pub const SOURCE_FILE_COLUMN: &str = "source_file";
pub const SAMPLE_TIME_COLUMN: &str = "sample_time";

/// A station CSV that was not merged, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Lists `*.csv` files directly inside `dir`, sorted by path.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.csv");
    let pattern_str = pattern.to_string_lossy();

    let mut files = Vec::new();
    for entry in glob::glob(&pattern_str)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!("could not read path from glob pattern: {err}"),
        }
    }
    files.sort();
    Ok(files)
}

/// Parses one station CSV; the file name becomes the record source.
pub fn load_station_file(path: &Path, columns: &ColumnNames) -> Result<StationFile> {
    let content = fs::read_to_string(path)?;
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(parse_station_csv(&source, &content, columns)?)
}

/// Loads every file, logging and skipping the ones that cannot be used.
pub fn load_station_files(
    paths: &[PathBuf],
    columns: &ColumnNames,
) -> (Vec<StationFile>, Vec<SkippedFile>) {
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        match load_station_file(path, columns) {
            Ok(file) => {
                info!(
                    file = %path.display(),
                    rows = file.records.len(),
                    dropped = file.dropped_rows,
                    "loaded station file"
                );
                loaded.push(file);
            }
            Err(err) => {
                warn!(file = %path.display(), "skipping station file: {err}");
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    (loaded, skipped)
}

/// Concatenates station records into one frame sorted by sample time.
///
/// Rows with equal sample times keep their file order. Returns `None` when there
/// are no files to merge.
pub fn merge_station_files(files: &[StationFile]) -> Result<Option<DataFrame>> {
    if files.is_empty() {
        return Ok(None);
    }

    let mut records: Vec<&MeasurementRecord> =
        files.iter().flat_map(|file| file.records.iter()).collect();
    records.sort_by_key(|record| record.sample_time);

    Ok(Some(records_to_frame(&records)?))
}

pub fn records_to_frame(records: &[&MeasurementRecord]) -> Result<DataFrame> {
    let sources: Vec<&str> = records.iter().map(|r| r.source.as_str()).collect();
    let times: Vec<i64> = records
        .iter()
        .map(|r| r.sample_time.and_utc().timestamp_micros())
        .collect();

    let time_series = Series::new(SAMPLE_TIME_COLUMN.into(), times)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut columns: Vec<Column> = Vec::with_capacity(2 + Parameter::ALL.len());
    columns.push(Series::new(SOURCE_FILE_COLUMN.into(), sources).into());
    columns.push(time_series.into());
    for parameter in Parameter::ALL {
        let values: Vec<Option<f64>> = records.iter().map(|r| r.value(parameter)).collect();
        columns.push(Series::new(parameter.canonical_name().into(), values).into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Reads the merged frame back into records, in frame order.
pub fn frame_records(df: &DataFrame) -> Result<Vec<MeasurementRecord>> {
    let sources = df.column(SOURCE_FILE_COLUMN)?.str()?;
    let times = df.column(SAMPLE_TIME_COLUMN)?.datetime()?;
    let mut values = Vec::with_capacity(Parameter::ALL.len());
    for parameter in Parameter::ALL {
        values.push((parameter, df.column(parameter.canonical_name())?.f64()?));
    }

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let Some(sample_time) = times.get(idx).and_then(micros_to_naive) else {
            continue;
        };
        let mut record = MeasurementRecord::new(sample_time, sources.get(idx).unwrap_or_default());
        for (parameter, column) in &values {
            record.set_value(*parameter, column.get(idx));
        }
        records.push(record);
    }
    Ok(records)
}

/// The rows of `df` that came from `source`.
pub fn station_records(df: &DataFrame, source: &str) -> Result<Vec<MeasurementRecord>> {
    let mask = df.column(SOURCE_FILE_COLUMN)?.str()?.equal(source);
    let station = df.filter(&mask)?;
    frame_records(&station)
}

pub(crate) fn micros_to_naive(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
