//! Record-aware splitting of a large delimited file into smaller files.
//!
//! Every output file repeats the source header. Quoted fields with embedded
//! delimiters or newlines are carried through intact because rows are read
//! and written by the `csv` crate rather than by line.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, Writer, WriterBuilder};
use serde::Serialize;
use tracing::{debug, info};

use crate::constants::DEFAULT_ROWS_PER_SPLIT_FILE;
use crate::error::{CleanerError, Result};
use crate::observability::metrics::split as metrics;

#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Maximum data rows per output file (header excluded)
    pub rows_per_file: u64,
    /// Delimiter of the source; output files keep it
    pub delimiter: u8,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            rows_per_file: DEFAULT_ROWS_PER_SPLIT_FILE,
            delimiter: b',',
        }
    }
}

impl SplitConfig {
    pub fn rows_per_file(mut self, rows: u64) -> Self {
        self.rows_per_file = rows;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitResult {
    /// Generated files in order
    pub paths: Vec<PathBuf>,
    /// Data rows in each file, parallel to `paths`
    pub rows_per_file: Vec<u64>,
    pub total_rows: u64,
}

/// Splits `source` into `output_dir/chunk_{i}.csv` files.
pub fn split_file(source: &Path, output_dir: &Path, config: &SplitConfig) -> Result<SplitResult> {
    if !source.exists() {
        return Err(CleanerError::SourceNotFound(source.to_path_buf()));
    }
    if config.rows_per_file == 0 {
        return Err(CleanerError::Config("rows_per_file must be greater than zero".to_string()));
    }
    fs::create_dir_all(output_dir)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(config.delimiter)
        .flexible(true)
        .from_reader(BufReader::new(File::open(source)?));
    let headers = reader.byte_headers()?.clone();

    let mut result = SplitResult {
        paths: Vec::new(),
        rows_per_file: Vec::new(),
        total_rows: 0,
    };
    let mut current: Option<Writer<BufWriter<File>>> = None;
    let mut current_rows: u64 = 0;
    let mut record = ByteRecord::new();

    while reader.read_byte_record(&mut record)? {
        if current.is_none() || current_rows >= config.rows_per_file {
            if let Some(writer) = current.take() {
                finish_file(writer, current_rows, &mut result)?;
            }
            let path = output_dir.join(format!("chunk_{}.csv", result.paths.len()));
            let mut writer = WriterBuilder::new()
                .delimiter(config.delimiter)
                .flexible(true)
                .from_writer(BufWriter::new(File::create(&path)?));
            writer.write_byte_record(&headers)?;
            result.paths.push(path);
            current = Some(writer);
            current_rows = 0;
        }

        if let Some(writer) = current.as_mut() {
            writer.write_byte_record(&record)?;
            current_rows += 1;
            result.total_rows += 1;
        }
    }

    if let Some(writer) = current.take() {
        finish_file(writer, current_rows, &mut result)?;
    }

    info!(
        "Split {} into {} files ({} rows)",
        source.display(),
        result.paths.len(),
        result.total_rows
    );
    Ok(result)
}

fn finish_file(mut writer: Writer<BufWriter<File>>, rows: u64, result: &mut SplitResult) -> Result<()> {
    writer.flush()?;
    result.rows_per_file.push(rows);
    metrics::file_written(rows);
    if let Some(path) = result.paths.last() {
        debug!(rows, "Created {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rows_per_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        fs::write(&source, "a\n1\n").unwrap();
        let err = split_file(&source, dir.path(), &SplitConfig::default().rows_per_file(0)).unwrap_err();
        assert!(matches!(err, CleanerError::Config(_)));
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = split_file(&dir.path().join("nope.csv"), dir.path(), &SplitConfig::default()).unwrap_err();
        assert!(matches!(err, CleanerError::SourceNotFound(_)));
    }

    #[test]
    fn test_header_only_source_produces_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        fs::write(&source, "a,b\n").unwrap();
        let out = dir.path().join("out");
        let result = split_file(&source, &out, &SplitConfig::default()).unwrap();
        assert!(result.paths.is_empty());
        assert_eq!(result.total_rows, 0);
    }
}
