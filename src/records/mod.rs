//! CSV record source.
//!
//! Header names are kept as written apart from trimming; every value is
//! trimmed. Short rows get empty values for the missing columns and cells
//! beyond the header are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::template::Record;

const BOM: char = '\u{feff}';

/// Iterates the rows of a delimited file as [`Record`]s, in file order
pub struct RecordReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    source: String,
    row: usize,
}

impl RecordReader<File> {
    /// Open a CSV file with a header row
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AppError::Input {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(file, &path.display().to_string())
    }
}

impl<R: Read> RecordReader<R> {
    /// Wrap any reader; `source` names it in error messages
    pub fn from_reader(input: R, source: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| AppError::Input {
                path: source.to_string(),
                message: e.to_string(),
            })?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let name = if idx == 0 {
                    name.trim_start_matches(BOM)
                } else {
                    name
                };
                name.trim().to_string()
            })
            .collect();

        Ok(Self {
            reader,
            headers,
            source: source.to_string(),
            row: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn to_record(&self, row: &csv::StringRecord) -> Record {
        Record::from_pairs(
            self.headers
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), row.get(idx).unwrap_or("").trim().to_string())),
        )
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut row = csv::StringRecord::new();
        match self.reader.read_record(&mut row) {
            Ok(true) => {
                self.row += 1;
                Some(Ok(self.to_record(&row)))
            }
            Ok(false) => None,
            Err(e) => {
                self.row += 1;
                Some(Err(AppError::Input {
                    path: self.source.clone(),
                    message: format!("row {}: {}", self.row, e),
                }))
            }
        }
    }
}
