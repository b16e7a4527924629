//! Per-station four-panel trend charts.
//!
//! Planning (which points, which scale) is kept apart from drawing so the numbers
//! can be checked without rendering an image.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use plotters::coord::combinators::BindKeyPoints;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use wqmon_parser::{ColumnNames, MeasurementRecord, Parameter};

use crate::config::{Baselines, ChartConfig};
use crate::error::{PipelineError, Result};
use crate::merge::{micros_to_naive, station_records, SAMPLE_TIME_COLUMN};
use crate::scale::{AxisScale, SharedMaxima};

const STATION_COLOR: RGBColor = RGBColor(31, 119, 180);
const EXCEEDANCE_COLOR: RGBColor = RGBColor(255, 165, 0);

/// Calendar years covered by the whole merged frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSpan {
    pub first: i32,
    pub last: i32,
}

impl YearSpan {
    /// January 1 of the first year, as a fractional year.
    pub fn start(&self) -> f64 {
        self.first as f64
    }

    /// December 31 of the last year, as a fractional year.
    pub fn end(&self) -> f64 {
        NaiveDate::from_ymd_opt(self.last, 12, 31)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| fractional_year(&dt))
            .unwrap_or(self.last as f64 + 1.0)
    }

    pub fn years(&self) -> usize {
        (self.last - self.first + 1).max(1) as usize
    }

    /// January 1 of every covered year, one x-axis tick each.
    pub fn ticks(&self) -> Vec<f64> {
        (self.first..=self.last.max(self.first))
            .map(|year| year as f64)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelPlan {
    pub parameter: Parameter,
    pub title: String,
    pub y_label: String,
    pub baseline: f64,
    pub scale: AxisScale,
    /// Line points after gap filling.
    pub series: Vec<(NaiveDateTime, f64)>,
    /// Gap-filled points strictly above the baseline.
    pub exceedances: Vec<(NaiveDateTime, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationChart {
    pub source: String,
    pub rows: usize,
    pub years: YearSpan,
    pub panels: Vec<PanelPlan>,
}

/// Earliest and latest sample year in the merged frame.
pub fn year_span(df: &polars::prelude::DataFrame) -> Result<Option<YearSpan>> {
    let times = df.column(SAMPLE_TIME_COLUMN)?.datetime()?;
    let mut span: Option<YearSpan> = None;
    for idx in 0..df.height() {
        let Some(year) = times.get(idx).and_then(micros_to_naive).map(|dt| dt.year()) else {
            continue;
        };
        span = Some(match span {
            None => YearSpan {
                first: year,
                last: year,
            },
            Some(current) => YearSpan {
                first: current.first.min(year),
                last: current.last.max(year),
            },
        });
    }
    Ok(span)
}

/// Fills interior gaps by linear interpolation over row position and holds the last
/// value across trailing gaps. Leading gaps stay empty.
pub fn interpolate_linear(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut filled = values.to_vec();
    let mut previous: Option<(usize, f64)> = None;

    for idx in 0..values.len() {
        let Some(current) = values[idx] else {
            continue;
        };
        if let Some((prev_idx, prev_value)) = previous {
            let span = (idx - prev_idx) as f64;
            for (offset, slot) in filled[prev_idx + 1..idx].iter_mut().enumerate() {
                let weight = (offset + 1) as f64 / span;
                *slot = Some(prev_value + (current - prev_value) * weight);
            }
        }
        previous = Some((idx, current));
    }

    if let Some((last_idx, last_value)) = previous {
        for slot in filled[last_idx + 1..].iter_mut() {
            *slot = Some(last_value);
        }
    }

    filled
}

/// Builds the four panels for one station from its time-ordered records.
pub fn plan_panels(
    records: &[MeasurementRecord],
    maxima: &SharedMaxima,
    baselines: &Baselines,
    columns: &ColumnNames,
    unit: &str,
) -> Vec<PanelPlan> {
    Parameter::ALL
        .iter()
        .map(|parameter| {
            let raw: Vec<Option<f64>> = records.iter().map(|r| r.value(*parameter)).collect();
            let baseline = baselines.get(*parameter);
            let header = columns.parameter(*parameter);

            let series: Vec<(NaiveDateTime, f64)> = records
                .iter()
                .zip(interpolate_linear(&raw))
                .filter_map(|(record, value)| value.map(|v| (record.sample_time, v)))
                .collect();

            let exceedances = series
                .iter()
                .filter(|(_, value)| *value > baseline)
                .copied()
                .collect();

            PanelPlan {
                parameter: *parameter,
                title: header.to_string(),
                y_label: format!("{header} ({unit})"),
                baseline,
                scale: maxima.scale(*parameter),
                series,
                exceedances,
            }
        })
        .collect()
}

/// Plans the chart for `source`, or `None` when the merged frame has no rows for it.
pub fn plan_station_chart(
    df: &polars::prelude::DataFrame,
    source: &str,
    years: YearSpan,
    maxima: &SharedMaxima,
    baselines: &Baselines,
    columns: &ColumnNames,
    unit: &str,
) -> Result<Option<StationChart>> {
    let records = station_records(df, source)?;
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(StationChart {
        source: source.to_string(),
        rows: records.len(),
        years,
        panels: plan_panels(&records, maxima, baselines, columns, unit),
    }))
}

/// `<dir>/<image_dir>/<source>_water_quality_trends.png`
pub fn chart_path(dir: &Path, image_dir: &str, source: &str) -> PathBuf {
    dir.join(image_dir)
        .join(format!("{source}_water_quality_trends.png"))
}

pub fn render_station_chart(chart: &StationChart, path: &Path, config: &ChartConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let areas = root.split_evenly((2, 2));
    for (area, panel) in areas.iter().zip(chart.panels.iter()) {
        draw_panel(area, chart, panel, config)?;
    }

    root.present().map_err(render_error)?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    chart: &StationChart,
    panel: &PanelPlan,
    config: &ChartConfig,
) -> Result<()> {
    let font = config.font_family.as_str();
    let x_start = chart.years.start();
    let x_end = chart.years.end();
    let x_ticks = chart.years.ticks();
    let y_ticks = panel.scale.ticks();
    let (x_count, y_count) = (x_ticks.len(), y_ticks.len());

    let mut ctx = ChartBuilder::on(area)
        .caption(&panel.title, (font, 32))
        .margin(24)
        .set_label_area_size(LabelAreaPosition::Left, 90)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(
            (x_start..x_end).with_key_points(x_ticks),
            (0.0..panel.scale.limit).with_key_points(y_ticks),
        )
        .map_err(render_error)?;

    let tick = panel.scale.tick;
    ctx.configure_mesh()
        .x_labels(x_count)
        .x_label_formatter(&|x: &f64| format!("{x:.0}"))
        .y_labels(y_count)
        .y_label_formatter(&|y: &f64| format_tick(*y, tick))
        .y_desc(panel.y_label.as_str())
        .label_style((font, 20))
        .axis_desc_style((font, 22))
        .draw()
        .map_err(render_error)?;

    let points: Vec<(f64, f64)> = panel
        .series
        .iter()
        .map(|(time, value)| (fractional_year(time), *value))
        .collect();

    ctx.draw_series(LineSeries::new(points.iter().copied(), STATION_COLOR.stroke_width(2)))
        .map_err(render_error)?
        .label(chart.source.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], STATION_COLOR));

    ctx.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, STATION_COLOR.filled())),
    )
    .map_err(render_error)?;

    if !panel.exceedances.is_empty() {
        ctx.draw_series(
            panel
                .exceedances
                .iter()
                .map(|(time, value)| Circle::new((fractional_year(time), *value), 7, EXCEEDANCE_COLOR.filled())),
        )
        .map_err(render_error)?
        .label("above baseline")
        .legend(|(x, y)| Circle::new((x + 10, y), 5, EXCEEDANCE_COLOR.filled()));
    }

    ctx.draw_series(DashedLineSeries::new(
        vec![(x_start, panel.baseline), (x_end, panel.baseline)],
        12,
        6,
        RED.stroke_width(2),
    ))
    .map_err(render_error)?
    .label(format!("baseline ({})", panel.baseline))
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    ctx.configure_series_labels()
        .label_font((font, 18))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_error)?;

    Ok(())
}

/// Position of `dt` on a continuous year axis, e.g. July 2 2021 ≈ 2021.5.
pub fn fractional_year(dt: &NaiveDateTime) -> f64 {
    let year = dt.year();
    let days_in_year = NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|date| date.ordinal())
        .unwrap_or(365) as f64;
    let seconds = dt.num_seconds_from_midnight() as f64 / 86_400.0;
    year as f64 + (dt.ordinal0() as f64 + seconds) / days_in_year
}

fn format_tick(value: f64, tick: f64) -> String {
    let decimals = if tick >= 1.0 {
        0
    } else {
        (-tick.log10().floor()) as usize
    };
    format!("{value:.decimals$}")
}

fn render_error<E: std::fmt::Display>(err: E) -> PipelineError {
    PipelineError::Render(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_fills_interior_and_trailing_gaps() {
        let filled = interpolate_linear(&[None, Some(1.0), None, None, Some(4.0), None]);
        assert_eq!(
            filled,
            vec![None, Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(4.0)]
        );
    }

    #[test]
    fn interpolation_of_all_missing_stays_missing() {
        assert_eq!(interpolate_linear(&[None, None]), vec![None, None]);
        assert!(interpolate_linear(&[]).is_empty());
    }

    #[test]
    fn fractional_year_starts_at_integer() {
        let jan_first = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(fractional_year(&jan_first), 2020.0);

        let mid = NaiveDate::from_ymd_opt(2021, 7, 2)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");
        assert!((fractional_year(&mid) - 2021.5).abs() < 1e-9);
    }

    #[test]
    fn year_span_end_is_last_december() {
        let span = YearSpan {
            first: 2019,
            last: 2021,
        };
        assert_eq!(span.start(), 2019.0);
        assert!(span.end() > 2021.99 && span.end() < 2022.0);
        assert_eq!(span.years(), 3);
        assert_eq!(span.ticks(), vec![2019.0, 2020.0, 2021.0]);
    }

    #[test]
    fn single_year_span_has_one_tick() {
        let span = YearSpan {
            first: 2020,
            last: 2020,
        };
        assert_eq!(span.ticks(), vec![2020.0]);
        assert!(span.ticks().iter().all(|x| *x >= span.start() && *x <= span.end()));
    }

    #[test]
    fn tick_labels_follow_tick_precision() {
        assert_eq!(format_tick(20.0, 20.0), "20");
        assert_eq!(format_tick(0.2, 0.2), "0.2");
        assert_eq!(format_tick(0.04, 0.02), "0.04");
    }
}
