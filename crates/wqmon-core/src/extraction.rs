//! Spreadsheet → per-sheet CSV export.
//!
//! Each sheet is handled on its own: a sheet that cannot be read, is empty, or has
//! none of the required columns is logged and skipped, and the remaining sheets are
//! still exported.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;
use wqmon_parser::{
    normalize_cell, require_numeric, CellValue, ColumnNames, NormalizeError, Sheet, SheetSource,
};

use crate::error::Result;
use crate::error_log::ErrorLog;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetStatus {
    Exported,
    ReadFailed(String),
    Empty,
    NoRequiredColumns,
    WriteFailed(String),
}

impl SheetStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SheetStatus::Exported => "exported",
            SheetStatus::ReadFailed(_) => "read failed",
            SheetStatus::Empty => "empty",
            SheetStatus::NoRequiredColumns => "no required columns",
            SheetStatus::WriteFailed(_) => "write failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetReport {
    pub sheet: String,
    pub status: SheetStatus,
    pub rows_written: usize,
    pub problematic_rows: usize,
    pub output: Option<PathBuf>,
    pub error_output: Option<PathBuf>,
}

impl SheetReport {
    fn skipped(sheet: &str, status: SheetStatus) -> Self {
        Self {
            sheet: sheet.to_string(),
            status,
            rows_written: 0,
            problematic_rows: 0,
            output: None,
            error_output: None,
        }
    }
}

/// A measurement cell that is still not numeric after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemCell {
    /// 1-based data row, not counting the header row.
    pub row: usize,
    pub column: String,
    pub value: String,
    pub error: NormalizeError,
}

/// The selected columns of one sheet after normalization.
#[derive(Debug, Clone)]
pub struct CleanedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub problems: Vec<ProblemCell>,
    /// Distinct 0-based indices into `Sheet::rows` that contained a problem cell.
    pub problematic_rows: Vec<usize>,
}

/// Normalizes the required columns found in `sheet`, in sheet order.
///
/// Returns `None` when the sheet has none of the required columns.
pub fn clean_sheet(sheet: &Sheet, columns: &ColumnNames) -> Option<CleanedSheet> {
    let required = columns.required();
    let selected: Vec<usize> = sheet
        .headers
        .iter()
        .enumerate()
        .filter(|(_, header)| required.contains(&header.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    if selected.is_empty() {
        return None;
    }

    let headers = selected
        .iter()
        .map(|idx| sheet.headers[*idx].clone())
        .collect();

    let mut rows = Vec::with_capacity(sheet.rows.len());
    let mut problems = Vec::new();
    let mut problematic_rows = BTreeSet::new();

    for row_idx in 0..sheet.rows.len() {
        let mut cleaned = Vec::with_capacity(selected.len());
        for &col_idx in &selected {
            let header = &sheet.headers[col_idx];
            let raw = sheet.cell(row_idx, col_idx);
            let normalized = normalize_cell(raw);

            if columns.parameter_for(header).is_some() {
                if let Err(error) = require_numeric(&normalized) {
                    problems.push(ProblemCell {
                        row: row_idx + 1,
                        column: header.clone(),
                        value: raw.to_string(),
                        error,
                    });
                    problematic_rows.insert(row_idx);
                }
            }
            cleaned.push(normalized);
        }
        rows.push(cleaned);
    }

    Some(CleanedSheet {
        headers,
        rows,
        problems,
        problematic_rows: problematic_rows.into_iter().collect(),
    })
}

/// Exports every requested sheet (all sheets when `sheet_names` is empty).
pub fn extract_workbook<S>(
    source: &mut S,
    sheet_names: &[String],
    columns: &ColumnNames,
    output_dir: &Path,
    log: &mut ErrorLog,
) -> Vec<SheetReport>
where
    S: SheetSource + ?Sized,
{
    let names = if sheet_names.is_empty() {
        source.sheet_names()
    } else {
        sheet_names.to_vec()
    };

    let mut reports = Vec::with_capacity(names.len());
    for name in &names {
        let sheet = match source.read_sheet(name) {
            Ok(sheet) => sheet,
            Err(err) => {
                log.error(format!("failed to read sheet {name}: {err}"));
                reports.push(SheetReport::skipped(
                    name,
                    SheetStatus::ReadFailed(err.to_string()),
                ));
                continue;
            }
        };

        let report = match extract_sheet(&sheet, columns, output_dir, log) {
            Ok(report) => report,
            Err(err) => {
                log.error(format!("failed to write output for sheet {name}: {err}"));
                SheetReport::skipped(name, SheetStatus::WriteFailed(err.to_string()))
            }
        };
        reports.push(report);
    }
    reports
}

/// Writes `<sheet>.csv` and, when needed, `error_data_<sheet>.csv` into `output_dir`.
pub fn extract_sheet(
    sheet: &Sheet,
    columns: &ColumnNames,
    output_dir: &Path,
    log: &mut ErrorLog,
) -> Result<SheetReport> {
    let name = sheet.name.as_str();

    if sheet.is_empty() {
        log.warn(format!("sheet {name} is empty, skipped"));
        return Ok(SheetReport::skipped(name, SheetStatus::Empty));
    }

    let Some(cleaned) = clean_sheet(sheet, columns) else {
        log.warn(format!(
            "sheet {name} has none of the required columns, skipped"
        ));
        return Ok(SheetReport::skipped(name, SheetStatus::NoRequiredColumns));
    };

    for problem in &cleaned.problems {
        log.error(format!(
            "data error: sheet {name}, row {}, column {}, value: {}, error: {}",
            problem.row, problem.column, problem.value, problem.error
        ));
    }

    fs::create_dir_all(output_dir)?;

    let mut error_output = None;
    if !cleaned.problematic_rows.is_empty() {
        let path = output_dir.join(format!("error_data_{name}.csv"));
        let rows = cleaned
            .problematic_rows
            .iter()
            .map(|idx| sheet.rows[*idx].iter().map(CellValue::to_string).collect());
        write_csv_with_bom(&path, &sheet.headers, rows)?;
        log.info(format!("saved problematic rows to {}", path.display()));
        error_output = Some(path);
    }

    let mut headers = Vec::with_capacity(cleaned.headers.len() + 1);
    headers.push(columns.source_sheet.clone());
    headers.extend(cleaned.headers.iter().cloned());

    let rows = cleaned.rows.iter().map(|row| {
        let mut out = Vec::with_capacity(row.len() + 1);
        out.push(name.to_string());
        out.extend(row.iter().map(CellValue::to_string));
        out
    });

    let output = output_dir.join(format!("{name}.csv"));
    write_csv_with_bom(&output, &headers, rows)?;
    info!(sheet = name, rows = cleaned.rows.len(), path = %output.display(), "exported sheet");

    Ok(SheetReport {
        sheet: name.to_string(),
        status: SheetStatus::Exported,
        rows_written: cleaned.rows.len(),
        problematic_rows: cleaned.problematic_rows.len(),
        output: Some(output),
        error_output,
    })
}

/// Writes a UTF-8 CSV prefixed with a byte-order mark so spreadsheet tools detect the encoding.
pub fn write_csv_with_bom<I>(path: &Path, headers: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
