// crates/wqmon-core/src/error.rs

use thiserror::Error;
use wqmon_parser::ParserError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
