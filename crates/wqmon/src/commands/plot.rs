use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use wqmon_core::visualize::{run_visualization, ChartStatus};
use wqmon_core::Config;

#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Directory holding the per-station CSV files
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

pub fn handle_plot(args: PlotArgs, config: &Config) -> Result<()> {
    let report = run_visualization(&args.dir, config)?;

    if report.charts.is_empty() {
        println!(
            "No station CSV files with the required columns in {}",
            args.dir.display()
        );
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["File", "Rows", "Chart"]);
        for chart in &report.charts {
            let status = match &chart.status {
                ChartStatus::Rendered(path) => path.display().to_string(),
                ChartStatus::Failed(err) => format!("failed: {err}"),
            };
            table.add_row(vec![chart.source.clone(), chart.rows.to_string(), status]);
        }
        println!("{table}");
    }

    for skipped in &report.skipped {
        println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    for source in &report.empty {
        println!("Skipped {source}: no rows with a valid sample time");
    }

    let failed = report
        .charts
        .iter()
        .filter(|chart| matches!(chart.status, ChartStatus::Failed(_)))
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} chart(s) could not be rendered");
    }
    Ok(())
}
