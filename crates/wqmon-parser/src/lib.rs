pub mod errors;
pub mod model;
pub mod normalize;
mod station_csv;
mod workbook;

pub use errors::{NormalizeError, ParserError};
pub use model::{CellValue, ColumnNames, MeasurementRecord, Parameter, Sheet, StationFile};
pub use normalize::{normalize_cell, normalize_text, require_numeric};
pub use station_csv::{parse_sample_time, parse_station_csv};
pub use workbook::{InMemoryWorkbook, SheetSource, XlsxWorkbook};

#[cfg(test)]
mod tests;
