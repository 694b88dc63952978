//! Append-only result log.
//!
//! One CSV line per processed row: `timestamp,email,sector,status,error`.
//! Existing content is never rewritten; the header goes in only when the
//! file is created by this run.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::campaign::OutcomeEntry;
use crate::error::{AppError, Result};

pub const RESULT_COLUMNS: [&str; 5] = ["timestamp", "email", "sector", "status", "error"];

pub struct ResultLog<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl ResultLog<File> {
    /// Open `path` for appending, creating parent directories as needed
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let existed = path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        tracing::debug!(path = %path.display(), new_file = !existed, "Result log opened");
        Self::new(file, !existed)
    }
}

impl<W: Write> ResultLog<W> {
    pub fn new(output: W, write_header: bool) -> Result<Self> {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(output);
        let mut log = Self { writer, rows: 0 };

        if write_header {
            log.writer.write_record(RESULT_COLUMNS).map_err(log_error)?;
            log.writer.flush()?;
        }

        Ok(log)
    }

    /// Append and flush one entry
    pub fn append(&mut self, entry: &OutcomeEntry) -> Result<()> {
        self.writer.write_record(entry.to_row()).map_err(log_error)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Entries appended through this handle
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| AppError::ResultLog(e.to_string()))
    }
}

fn log_error(err: csv::Error) -> AppError {
    AppError::ResultLog(err.to_string())
}
