//! Directory of station CSVs → one trend image per station.

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::charts::{chart_path, plan_station_chart, render_station_chart, year_span, StationChart};
use crate::config::Config;
use crate::error::Result;
use crate::merge::{discover_csv_files, load_station_files, merge_station_files, SkippedFile};
use crate::scale::{shared_axis_maxima, SharedMaxima};

/// Everything needed to draw the station charts, before any image is written.
#[derive(Debug)]
pub struct VisualizationPlan {
    pub merged: DataFrame,
    pub maxima: SharedMaxima,
    pub charts: Vec<StationChart>,
    pub skipped: Vec<SkippedFile>,
    /// Loaded files that ended up with no usable rows.
    pub empty: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartStatus {
    Rendered(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ChartReport {
    pub source: String,
    pub rows: usize,
    pub status: ChartStatus,
}

#[derive(Debug, Default)]
pub struct VisualizationReport {
    pub charts: Vec<ChartReport>,
    pub skipped: Vec<SkippedFile>,
    pub empty: Vec<String>,
}

/// Loads and merges the CSVs in `dir` and plans one chart per usable file.
///
/// Returns `None` when no file could be merged.
pub fn plan_visualization(dir: &Path, config: &Config) -> Result<Option<VisualizationPlan>> {
    let paths = discover_csv_files(dir)?;
    info!(dir = %dir.display(), files = paths.len(), "discovered station files");

    let (files, skipped) = load_station_files(&paths, &config.columns);
    let Some(merged) = merge_station_files(&files)? else {
        warn!(dir = %dir.display(), "no station file had the required columns");
        return Ok(None);
    };

    let Some(years) = year_span(&merged)? else {
        warn!(dir = %dir.display(), "no rows with a valid sample time");
        return Ok(None);
    };

    let maxima = shared_axis_maxima(&merged, config.charts.headroom)?;

    let mut charts = Vec::with_capacity(files.len());
    let mut empty = Vec::new();
    for file in &files {
        match plan_station_chart(
            &merged,
            &file.source,
            years,
            &maxima,
            &config.baselines,
            &config.columns,
            &config.charts.unit,
        )? {
            Some(chart) => charts.push(chart),
            None => {
                warn!(file = file.source.as_str(), "no rows with a valid sample time, no chart");
                empty.push(file.source.clone());
            }
        }
    }

    Ok(Some(VisualizationPlan {
        merged,
        maxima,
        charts,
        skipped,
        empty,
    }))
}

/// Plans and renders every chart into `<dir>/<image_dir>/`. A failing image is
/// reported and the remaining charts are still drawn.
pub fn run_visualization(dir: &Path, config: &Config) -> Result<VisualizationReport> {
    let Some(plan) = plan_visualization(dir, config)? else {
        return Ok(VisualizationReport::default());
    };

    let mut charts = Vec::with_capacity(plan.charts.len());
    for chart in &plan.charts {
        let path = chart_path(dir, &config.charts.image_dir, &chart.source);
        let status = match render_station_chart(chart, &path, &config.charts) {
            Ok(()) => {
                info!(file = chart.source.as_str(), path = %path.display(), "saved chart");
                ChartStatus::Rendered(path)
            }
            Err(err) => {
                warn!(file = chart.source.as_str(), "failed to render chart: {err}");
                ChartStatus::Failed(err.to_string())
            }
        };
        charts.push(ChartReport {
            source: chart.source.clone(),
            rows: chart.rows,
            status,
        });
    }

    Ok(VisualizationReport {
        charts,
        skipped: plan.skipped,
        empty: plan.empty,
    })
}
