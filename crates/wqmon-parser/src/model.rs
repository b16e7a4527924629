use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used when a date/time cell is written back out as text.
pub const SAMPLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A spreadsheet cell before (or after) normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Header cells are compared by their trimmed textual form.
    pub fn header_text(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(SAMPLE_TIME_FORMAT)),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    SuspendedSolids,
    AmmoniaNitrogen,
    Bod,
    TotalPhosphorus,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::SuspendedSolids,
        Parameter::AmmoniaNitrogen,
        Parameter::Bod,
        Parameter::TotalPhosphorus,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Parameter::SuspendedSolids => "suspended_solids",
            Parameter::AmmoniaNitrogen => "ammonia_nitrogen",
            Parameter::Bod => "bod",
            Parameter::TotalPhosphorus => "total_phosphorus",
        }
    }

    pub fn default_header(&self) -> &'static str {
        match self {
            Parameter::SuspendedSolids => "懸浮固體",
            Parameter::AmmoniaNitrogen => "氨氮",
            Parameter::Bod => "生化需氧量",
            Parameter::TotalPhosphorus => "總磷",
        }
    }

    /// Reference threshold drawn as the baseline on charts, in mg/L.
    pub fn default_baseline(&self) -> f64 {
        match self {
            Parameter::SuspendedSolids => 50.0,
            Parameter::AmmoniaNitrogen => 0.1,
            Parameter::Bod => 1.0,
            Parameter::TotalPhosphorus => 25.0,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Header names used in the source spreadsheets and the CSV files derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub sample_time: String,
    pub suspended_solids: String,
    pub ammonia_nitrogen: String,
    pub bod: String,
    pub total_phosphorus: String,
    pub source_sheet: String,
    pub source_file: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            sample_time: "採樣時間".to_string(),
            suspended_solids: Parameter::SuspendedSolids.default_header().to_string(),
            ammonia_nitrogen: Parameter::AmmoniaNitrogen.default_header().to_string(),
            bod: Parameter::Bod.default_header().to_string(),
            total_phosphorus: Parameter::TotalPhosphorus.default_header().to_string(),
            source_sheet: "來源工作表".to_string(),
            source_file: "來源檔案".to_string(),
        }
    }
}

impl ColumnNames {
    pub fn parameter(&self, parameter: Parameter) -> &str {
        match parameter {
            Parameter::SuspendedSolids => &self.suspended_solids,
            Parameter::AmmoniaNitrogen => &self.ammonia_nitrogen,
            Parameter::Bod => &self.bod,
            Parameter::TotalPhosphorus => &self.total_phosphorus,
        }
    }

    /// The five required headers, sample time first.
    pub fn required(&self) -> Vec<&str> {
        let mut names = vec![self.sample_time.as_str()];
        names.extend(Parameter::ALL.iter().map(|p| self.parameter(*p)));
        names
    }

    pub fn parameter_for(&self, header: &str) -> Option<Parameter> {
        Parameter::ALL
            .iter()
            .copied()
            .find(|p| self.parameter(*p) == header)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub sample_time: NaiveDateTime,
    pub suspended_solids: Option<f64>,
    pub ammonia_nitrogen: Option<f64>,
    pub bod: Option<f64>,
    pub total_phosphorus: Option<f64>,
    pub source: String,
}

impl MeasurementRecord {
    pub fn new(sample_time: NaiveDateTime, source: impl Into<String>) -> Self {
        Self {
            sample_time,
            suspended_solids: None,
            ammonia_nitrogen: None,
            bod: None,
            total_phosphorus: None,
            source: source.into(),
        }
    }

    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::SuspendedSolids => self.suspended_solids,
            Parameter::AmmoniaNitrogen => self.ammonia_nitrogen,
            Parameter::Bod => self.bod,
            Parameter::TotalPhosphorus => self.total_phosphorus,
        }
    }

    pub fn set_value(&mut self, parameter: Parameter, value: Option<f64>) {
        let slot = match parameter {
            Parameter::SuspendedSolids => &mut self.suspended_solids,
            Parameter::AmmoniaNitrogen => &mut self.ammonia_nitrogen,
            Parameter::Bod => &mut self.bod,
            Parameter::TotalPhosphorus => &mut self.total_phosphorus,
        };
        *slot = value;
    }
}

/// One spreadsheet tab: the first row becomes `headers`, the rest `rows`.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY)
    }
}

/// Records parsed from one station CSV.
#[derive(Debug, Clone)]
pub struct StationFile {
    pub source: String,
    pub records: Vec<MeasurementRecord>,
    pub dropped_rows: usize,
}
