use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("{source_name} CSV error: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{source_name} did not contain a header row")]
    MissingHeader { source_name: String },

    #[error("{source_name} is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        source_name: String,
        missing: Vec<String>,
    },
}

/// A normalized measurement cell that still is not a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("value '{0}' is not numeric after normalization")]
    NotNumeric(String),

    #[error("boolean value '{0}' in a measurement column")]
    Boolean(bool),

    #[error("date/time value '{0}' in a measurement column")]
    DateTime(String),
}
