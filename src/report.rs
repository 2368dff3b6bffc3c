//! # Report Writer Module
//!
//! Scrittura dei report CSV e dei nomi file con timestamp.
//!
//! ## Responsabilità:
//! - `CsvReport`: writer `csv` con delimitatore configurabile e flush per riga,
//!   così un'interruzione lascia un report parziale ma leggibile
//! - Parsing del delimitatore da CLI (`\t`, `tab`, `,`, `;`, ...)
//! - Timestamp locali per i nomi dei report

use crate::error::{MediaToolError, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Timestamp used in report file names, `YYYYmmdd-HHMMSS`
pub fn file_timestamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Timestamp with an underscore separator, `YYYYmmdd_HHMMSS`
pub fn compact_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Accepts a single ASCII character, `\t` or `tab`
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "\\t" | "tab" | "TAB" | "\t" => Ok(b'\t'),
        other => {
            let bytes = other.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() {
                Ok(bytes[0])
            } else {
                Err(MediaToolError::Validation(format!(
                    "Delimiter must be a single ASCII character, got {:?}",
                    other
                )))
            }
        }
    }
}

/// Human label for a delimiter, `TAB` for tabs
pub fn delimiter_label(delimiter: u8) -> String {
    if delimiter == b'\t' {
        "TAB".to_string()
    } else {
        format!("{:?}", delimiter as char)
    }
}

/// CSV file written row by row
pub struct CsvReport {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvReport {
    /// Create the file (and its parent directory); headers come from the row type
    pub fn create(path: &Path, delimiter: u8) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(path)?;
        debug!("Writing report to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn write_row<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}
