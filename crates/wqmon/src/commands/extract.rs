use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use tracing::info;
use wqmon_core::extraction::{extract_workbook, SheetStatus};
use wqmon_core::{Config, ErrorLog};
use wqmon_parser::XlsxWorkbook;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Workbook to read (.xlsx, .xls or .ods)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Sheet to export; repeat for several. Overrides `extraction.sheets`.
    #[arg(short, long = "sheet")]
    pub sheets: Vec<String>,

    /// Where the CSV files and the error log are written (defaults to the workbook's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub fn handle_extract(args: ExtractArgs, config: &Config) -> Result<()> {
    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => args
            .input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let sheets = if args.sheets.is_empty() {
        config.extraction.sheets.clone()
    } else {
        args.sheets
    };

    let mut workbook = XlsxWorkbook::open(&args.input)
        .with_context(|| format!("failed to open workbook {}", args.input.display()))?;
    let mut log = ErrorLog::to_file(output_dir.join(&config.extraction.error_log));

    info!(input = %args.input.display(), output = %output_dir.display(), "extracting sheets");
    let reports = extract_workbook(
        &mut workbook,
        &sheets,
        &config.columns,
        &output_dir,
        &mut log,
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Sheet", "Status", "Rows", "Problem rows", "Output"]);
    for report in &reports {
        table.add_row(vec![
            report.sheet.clone(),
            report.status.label().to_string(),
            report.rows_written.to_string(),
            report.problematic_rows.to_string(),
            report
                .output
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        ]);
    }
    println!("{table}");

    let exported = reports
        .iter()
        .filter(|report| report.status == SheetStatus::Exported)
        .count();
    println!("Exported {exported} of {} sheets.", reports.len());
    if !log.entries().is_empty() {
        if let Some(path) = log.path() {
            println!("{} issue(s) recorded in {}", log.entries().len(), path.display());
        }
    }

    Ok(())
}
