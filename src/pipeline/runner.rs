use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, error, info, info_span, instrument};
use uuid::Uuid;

use crate::config::CleanerConfig;
use crate::error::{ChunkError, Result};
use crate::observability::metrics::cleaning as metrics;
use crate::pipeline::accumulator::ResultSets;
use crate::pipeline::chunk_reader::{ChunkReader, RawChunk};
use crate::pipeline::normalize::{normalize_chunk, ColumnMapping};
use crate::pipeline::transform::{ChunkOutcome, RecordCleaner};
use crate::pipeline::writer::write_records;

/// Destination paths for one run
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub clean: PathBuf,
    pub garbage: PathBuf,
    pub duplicates: PathBuf,
}

impl OutputPaths {
    pub fn new(clean: impl Into<PathBuf>, garbage: impl Into<PathBuf>, duplicates: impl Into<PathBuf>) -> Self {
        Self {
            clean: clean.into(),
            garbage: garbage.into(),
            duplicates: duplicates.into(),
        }
    }
}

/// A chunk that was skipped entirely
#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailure {
    /// 1-based chunk number, as logged
    pub chunk: usize,
    pub rows: usize,
    pub message: String,
}

/// Counts and outputs of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source: PathBuf,
    pub rows_read: usize,
    pub rows_clean: usize,
    pub rows_garbage: usize,
    pub rows_dropped_missing_email: usize,
    pub rows_dropped_invalid_email: usize,
    pub empty_rows: usize,
    pub rows_duplicated: usize,
    pub duplicate_groups: usize,
    /// Hex SHA-256 key of each duplicate group
    pub duplicate_fingerprints: Vec<String>,
    pub chunks_processed: usize,
    pub failed_chunks: Vec<ChunkFailure>,
    pub clean_output: Option<PathBuf>,
    pub garbage_output: Option<PathBuf>,
    pub duplicates_output: Option<PathBuf>,
    pub duration_secs: f64,
}

impl RunSummary {
    fn new(source: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.to_path_buf(),
            rows_read: 0,
            rows_clean: 0,
            rows_garbage: 0,
            rows_dropped_missing_email: 0,
            rows_dropped_invalid_email: 0,
            empty_rows: 0,
            rows_duplicated: 0,
            duplicate_groups: 0,
            duplicate_fingerprints: Vec::new(),
            chunks_processed: 0,
            failed_chunks: Vec::new(),
            clean_output: None,
            garbage_output: None,
            duplicates_output: None,
            duration_secs: 0.0,
        }
    }

    /// Rows discarded by the email filter
    pub fn rows_dropped(&self) -> usize {
        self.rows_dropped_missing_email + self.rows_dropped_invalid_email
    }

    pub fn chunks_failed(&self) -> usize {
        self.failed_chunks.len()
    }

    fn record_outcome(&mut self, outcome: &ChunkOutcome) {
        self.chunks_processed += 1;
        self.rows_clean += outcome.clean.len();
        self.rows_garbage += outcome.garbage.len();
        self.rows_dropped_missing_email += outcome.dropped_missing_email;
        self.rows_dropped_invalid_email += outcome.dropped_invalid_email;
        self.empty_rows += outcome.empty_rows;

        metrics::chunk_processed();
        metrics::rows_clean(outcome.clean.len());
        metrics::rows_garbage(outcome.garbage.len());
        metrics::rows_dropped("missing_email", outcome.dropped_missing_email);
        metrics::rows_dropped("invalid_email", outcome.dropped_invalid_email);
        metrics::rows_empty(outcome.empty_rows);
    }
}

/// Reads a record export in chunks and writes clean, garbage and duplicate
/// subsets.
///
/// Chunks are processed one after another. A chunk that fails for any
/// reason is logged and skipped as a whole; only a missing source, an
/// unreadable header, reader I/O failures and output write failures end the
/// run early.
pub struct RecordValidationPipeline {
    config: CleanerConfig,
    cleaner: RecordCleaner,
    reference_time: Option<NaiveDateTime>,
}

impl RecordValidationPipeline {
    pub fn new(config: CleanerConfig) -> Result<Self> {
        config.validate()?;
        let cleaner = RecordCleaner::from_config(&config)?;
        Ok(Self {
            config,
            cleaner,
            reference_time: None,
        })
    }

    /// Pins the "now" that birthdays are compared against
    pub fn with_reference_time(mut self, now: NaiveDateTime) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    pub fn run(
        &self,
        source: &Path,
        clean_output: &Path,
        garbage_output: &Path,
        duplicates_output: &Path,
    ) -> Result<RunSummary> {
        self.run_with_outputs(
            source,
            &OutputPaths::new(clean_output, garbage_output, duplicates_output),
        )
    }

    #[instrument(skip_all, fields(source = %source.display()))]
    pub fn run_with_outputs(&self, source: &Path, outputs: &OutputPaths) -> Result<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary::new(source);
        let span = info_span!("clean_run", run_id = %summary.run_id);
        let _enter = span.enter();

        info!(
            "Starting data processing for {} with chunk size {}",
            source.display(),
            self.config.chunk_size
        );
        metrics::run_started();

        let mut reader = ChunkReader::open(
            source,
            self.config.source_delimiter_byte()?,
            self.config.chunk_size,
        )?;
        let mapping = ColumnMapping::resolve(reader.headers(), &self.config.rename_mapping);
        let missing = mapping.missing_fields();
        if !missing.is_empty() {
            info!("Source lacks columns {:?}; they will be left empty", missing);
        }

        let mut results = ResultSets::new();
        while let Some(chunk) = reader.next_chunk()? {
            let number = chunk.number();
            info!("Processing chunk {}", number);
            debug!("Columns in chunk {}: {:?}", number, mapping.renamed_columns());
            summary.rows_read += chunk.rows_read;
            metrics::rows_read(chunk.rows_read);

            match self.process_chunk(chunk, &mapping) {
                Ok(outcome) => {
                    summary.record_outcome(&outcome);
                    results.absorb(outcome);
                }
                Err((rows, e)) => {
                    error!(chunk = number, "Error processing chunk {}: {}", number, e);
                    metrics::chunk_failed();
                    summary.failed_chunks.push(ChunkFailure {
                        chunk: number,
                        rows,
                        message: e.to_string(),
                    });
                }
            }
        }
        info!("Finished processing all chunks.");

        let delimiter = self.config.output_delimiter_byte()?;

        if !results.garbage().is_empty() {
            write_records(&outputs.garbage, results.garbage(), delimiter)?;
            info!("Garbage data exported to {}", outputs.garbage.display());
            summary.garbage_output = Some(outputs.garbage.clone());
        }

        if !results.clean().is_empty() {
            write_records(&outputs.clean, results.clean(), delimiter)?;
            info!("Clean data exported to {}", outputs.clean.display());
            summary.clean_output = Some(outputs.clean.clone());
        }

        let duplicates = results.duplicates();
        summary.rows_duplicated = duplicates.len();
        summary.duplicate_groups = duplicates.group_count();
        metrics::rows_duplicated(duplicates.len());
        if duplicates.is_empty() {
            info!("No duplicates found.");
        } else {
            for (fingerprint, size) in &duplicates.groups {
                debug!(%fingerprint, size, "Duplicate group");
                summary.duplicate_fingerprints.push(fingerprint.clone());
            }
            write_records(&outputs.duplicates, duplicates.records.iter().copied(), delimiter)?;
            info!(
                groups = duplicates.group_count(),
                "Duplicates exported to {}",
                outputs.duplicates.display()
            );
            summary.duplicates_output = Some(outputs.duplicates.clone());
        }

        summary.duration_secs = started.elapsed().as_secs_f64();
        metrics::run_duration(summary.duration_secs);
        info!(
            rows_read = summary.rows_read,
            clean = summary.rows_clean,
            garbage = summary.rows_garbage,
            dropped = summary.rows_dropped(),
            duplicated = summary.rows_duplicated,
            failed_chunks = summary.chunks_failed(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Normalizes and classifies one chunk. On failure returns the number of
    /// rows lost with the error.
    fn process_chunk(
        &self,
        chunk: RawChunk,
        mapping: &ColumnMapping,
    ) -> std::result::Result<ChunkOutcome, (usize, ChunkError)> {
        let rows = chunk.rows_read;
        if let Some(e) = chunk.read_error {
            return Err((rows, e));
        }
        let records = normalize_chunk(&chunk.records, mapping, &self.config.na_values)
            .map_err(|e| (rows, e))?;
        let now = self
            .reference_time
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        Ok(self.cleaner.process_chunk(records, now))
    }
}
