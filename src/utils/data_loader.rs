//! Data loading utilities

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Rows scanned for schema inference
const INFER_SCHEMA_ROWS: usize = 1000;

/// Comma-separated loader for the survey table
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PipelineError::DataError(format!("{}: {}", path.display(), e)))?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::DataError(format!("{}: {}", path.display(), e)))
    }

    /// Get file info without parsing the whole table
    pub fn get_file_info(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|e| PipelineError::DataError(e.to_string()))?;

        let file = File::open(path)
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
        let mut lines = BufReader::new(file).lines();

        let header = lines
            .next()
            .transpose()
            .map_err(|e| PipelineError::DataError(e.to_string()))?
            .unwrap_or_default();

        let columns: Vec<String> = header
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let n_rows = lines
            .map_while(|line| line.ok())
            .filter(|line| !line.trim().is_empty())
            .count();

        Ok(FileInfo {
            path: path.display().to_string(),
            file_size: metadata.len(),
            n_rows,
            n_cols: columns.len(),
            columns,
        })
    }
}

/// File information
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub file_size: u64,
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<String>,
}
