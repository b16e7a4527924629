use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wqmon_parser::{ColumnNames, Parameter};

use crate::error::{PipelineError, Result};

/// Top-level configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub columns: ColumnNames,
    pub baselines: Baselines,
    pub extraction: ExtractionConfig,
    pub charts: ChartConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.charts.headroom.is_finite() || self.charts.headroom <= 0.0 {
            return Err(PipelineError::Validation(format!(
                "charts.headroom must be a positive number, got {}",
                self.charts.headroom
            )));
        }
        if self.charts.width == 0 || self.charts.height == 0 {
            return Err(PipelineError::Validation(
                "charts.width and charts.height must be non-zero".to_string(),
            ));
        }
        if self.extraction.error_log.trim().is_empty() {
            return Err(PipelineError::Validation(
                "extraction.error_log must name a file".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reference thresholds drawn as horizontal lines on each panel, in mg/L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Baselines {
    pub suspended_solids: f64,
    pub ammonia_nitrogen: f64,
    pub bod: f64,
    pub total_phosphorus: f64,
}

impl Default for Baselines {
    fn default() -> Self {
        Self {
            suspended_solids: Parameter::SuspendedSolids.default_baseline(),
            ammonia_nitrogen: Parameter::AmmoniaNitrogen.default_baseline(),
            bod: Parameter::Bod.default_baseline(),
            total_phosphorus: Parameter::TotalPhosphorus.default_baseline(),
        }
    }
}

impl Baselines {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::SuspendedSolids => self.suspended_solids,
            Parameter::AmmoniaNitrogen => self.ammonia_nitrogen,
            Parameter::Bod => self.bod,
            Parameter::TotalPhosphorus => self.total_phosphorus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sheets to export; empty means every sheet in the workbook.
    pub sheets: Vec<String>,
    /// Append-only log file, relative to the output directory.
    pub error_log: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            error_log: "error_log.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// Multiplier applied to the shared per-parameter maximum.
    pub headroom: f64,
    pub font_family: String,
    /// Subdirectory of the input directory that receives the images.
    pub image_dir: String,
    pub unit: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 3200,
            height: 2400,
            headroom: 1.05,
            font_family: "sans-serif".to_string(),
            image_dir: "img".to_string(),
            unit: "mg/L".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").expect("empty config parses");
        assert_eq!(config.columns, ColumnNames::default());
        assert_eq!(config.baselines.get(Parameter::AmmoniaNitrogen), 0.1);
        assert_eq!(config.charts.headroom, 1.05);
        assert_eq!(config.extraction.error_log, "error_log.txt");
        assert!(config.extraction.sheets.is_empty());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let raw = r#"
            [columns]
            sample_time = "Sampled"

            [baselines]
            bod = 2.5

            [extraction]
            sheets = ["G-1", "G-1A"]
        "#;
        let config = Config::from_toml_str(raw).expect("config parses");
        assert_eq!(config.columns.sample_time, "Sampled");
        assert_eq!(config.columns.bod, "生化需氧量");
        assert_eq!(config.baselines.get(Parameter::Bod), 2.5);
        assert_eq!(config.baselines.get(Parameter::SuspendedSolids), 50.0);
        assert_eq!(config.extraction.sheets, vec!["G-1", "G-1A"]);
    }

    #[test]
    fn rejects_non_positive_headroom() {
        let err = Config::from_toml_str("[charts]\nheadroom = 0.0\n").expect_err("should fail");
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn example_config_matches_defaults_apart_from_sheets() {
        let config = Config::from_toml_str(include_str!("../../../wqmon.example.toml"))
            .expect("example config parses");
        let defaults = Config::default();
        assert_eq!(config.columns, defaults.columns);
        assert_eq!(config.baselines, defaults.baselines);
        assert_eq!(config.charts, defaults.charts);
        assert_eq!(config.extraction.error_log, defaults.extraction.error_log);
        assert_eq!(config.extraction.sheets.len(), 11);
    }
}
