use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::ParserError;
use crate::model::{ColumnNames, MeasurementRecord, Parameter, StationFile};

const UTF8_BOM: char = '\u{feff}';

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Parses a sample time written by the extraction step or typed by hand.
pub fn parse_sample_time(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Reads one per-station CSV. Every required column must be present; rows whose
/// sample time cannot be parsed are dropped and counted, numeric cells that do not
/// parse to a finite number become null.
pub fn parse_station_csv(
    source_name: &str,
    content: &str,
    columns: &ColumnNames,
) -> Result<StationFile, ParserError> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| ParserError::Csv {
            source_name: source_name.to_string(),
            source: err,
        })?
        .clone();

    if headers.is_empty() {
        return Err(ParserError::MissingHeader {
            source_name: source_name.to_string(),
        });
    }

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let missing: Vec<String> = columns
        .required()
        .into_iter()
        .filter(|name| position(*name).is_none())
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ParserError::MissingColumns {
            source_name: source_name.to_string(),
            missing,
        });
    }

    let time_idx = position(columns.sample_time.as_str()).unwrap_or_default();
    let parameter_idx: Vec<(Parameter, usize)> = Parameter::ALL
        .iter()
        .filter_map(|p| position(columns.parameter(*p)).map(|idx| (*p, idx)))
        .collect();

    let mut records = Vec::new();
    let mut dropped_rows = 0usize;

    for record in reader.records() {
        let record = record.map_err(|err| ParserError::Csv {
            source_name: source_name.to_string(),
            source: err,
        })?;

        let Some(sample_time) = parse_sample_time(record.get(time_idx).unwrap_or("")) else {
            dropped_rows += 1;
            continue;
        };

        let mut measurement = MeasurementRecord::new(sample_time, source_name);
        for (parameter, idx) in &parameter_idx {
            measurement.set_value(*parameter, coerce_numeric(record.get(*idx).unwrap_or("")));
        }
        records.push(measurement);
    }

    Ok(StationFile {
        source: source_name.to_string(),
        records,
        dropped_rows,
    })
}

fn coerce_numeric(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}
