use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::errors::ParserError;
use crate::model::{CellValue, Sheet};

/// Anything that can hand out named sheets of cells.
pub trait SheetSource {
    fn sheet_names(&self) -> Vec<String>;
    fn read_sheet(&mut self, name: &str) -> Result<Sheet, ParserError>;
}

/// Spreadsheet file on disk (`.xlsx`, `.xlsm`, `.xls`, `.ods`).
pub struct XlsxWorkbook {
    inner: Sheets<BufReader<File>>,
}

impl XlsxWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ParserError> {
        let inner = open_workbook_auto(path.as_ref())?;
        Ok(Self { inner })
    }
}

impl SheetSource for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, ParserError> {
        if !self.inner.sheet_names().iter().any(|sheet| sheet == name) {
            return Err(ParserError::SheetNotFound(name.to_string()));
        }
        let range = self.inner.worksheet_range(name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        Ok(sheet_from_rows(name, rows))
    }
}

/// Sheets held in memory; used to drive the pipelines without a spreadsheet file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: Vec<Sheet>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet whose first row is the header row.
    pub fn with_rows(mut self, name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push(sheet_from_rows(name, rows));
        self
    }
}

impl SheetSource for InMemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, ParserError> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .cloned()
            .ok_or_else(|| ParserError::SheetNotFound(name.to_string()))
    }
}

fn sheet_from_rows(name: &str, rows: Vec<Vec<CellValue>>) -> Sheet {
    let mut iter = rows.into_iter();
    let Some(header_row) = iter.next() else {
        return Sheet::new(name, Vec::new(), Vec::new());
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let text = cell.header_text();
            if text.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                text
            }
        })
        .collect();

    let width = headers.len();
    let rows = iter
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|mut row| {
            row.resize(width, CellValue::Empty);
            row
        })
        .collect();

    Sheet::new(name, headers, rows)
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Bool(flag) => CellValue::Bool(*flag),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(err) => CellValue::Text(err.to_string()),
    }
}
