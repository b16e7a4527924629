use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Append-only plain-text log of problems found while processing sheets.
///
/// Every entry is also emitted through `tracing`. Failing to write the file never
/// aborts processing; the entry is still kept in memory.
#[derive(Debug, Default)]
pub struct ErrorLog {
    path: Option<PathBuf>,
    entries: Vec<String>,
}

impl ErrorLog {
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            entries: Vec::new(),
        }
    }

    /// A log that only keeps entries in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.append(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.append(message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.append(message);
    }

    fn append(&mut self, message: String) {
        if let Some(path) = self.path.as_deref() {
            let line = format!("{} {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
            if let Err(err) = append_line(path, &line) {
                tracing::error!(path = %path.display(), "failed to write error log: {err}");
            }
        }
        self.entries.push(message);
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
