pub mod charts;
pub mod config;
pub mod error;
pub mod error_log;
pub mod extraction;
pub mod merge;
pub mod scale;
pub mod visualize;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use error_log::ErrorLog;
