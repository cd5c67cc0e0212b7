//! Metrics for the record cleaner.
//!
//! Names live in [`MetricName`] so no call site carries a magic string.
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::fmt;
use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

use crate::constants::ENV_METRICS_ADDR;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Runs
    RunsTotal,
    RunDuration,

    // Chunks
    ChunksProcessed,
    ChunksFailed,

    // Rows
    RowsRead,
    RowsClean,
    RowsGarbage,
    RowsDropped,
    RowsEmpty,
    RowsDuplicated,

    // Splitter
    SplitFilesWritten,
    SplitRowsWritten,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RunsTotal => "record_cleaner_runs_total",
            MetricName::RunDuration => "record_cleaner_run_duration_seconds",
            MetricName::ChunksProcessed => "record_cleaner_chunks_processed_total",
            MetricName::ChunksFailed => "record_cleaner_chunks_failed_total",
            MetricName::RowsRead => "record_cleaner_rows_read_total",
            MetricName::RowsClean => "record_cleaner_rows_clean_total",
            MetricName::RowsGarbage => "record_cleaner_rows_garbage_total",
            MetricName::RowsDropped => "record_cleaner_rows_dropped_total",
            MetricName::RowsEmpty => "record_cleaner_rows_empty_total",
            MetricName::RowsDuplicated => "record_cleaner_rows_duplicated_total",
            MetricName::SplitFilesWritten => "record_cleaner_split_files_written_total",
            MetricName::SplitRowsWritten => "record_cleaner_split_rows_written_total",
        }
    }

    pub fn all() -> impl Iterator<Item = MetricName> {
        [
            MetricName::RunsTotal,
            MetricName::RunDuration,
            MetricName::ChunksProcessed,
            MetricName::ChunksFailed,
            MetricName::RowsRead,
            MetricName::RowsClean,
            MetricName::RowsGarbage,
            MetricName::RowsDropped,
            MetricName::RowsEmpty,
            MetricName::RowsDuplicated,
            MetricName::SplitFilesWritten,
            MetricName::SplitRowsWritten,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Installs the Prometheus recorder. Idempotent.
///
/// With `RECORD_CLEANER_METRICS_ADDR` set, metrics are also served over HTTP
/// at that address; otherwise they can be read back with [`render_metrics`].
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }

    if let Ok(addr_str) = std::env::var(ENV_METRICS_ADDR) {
        match addr_str.parse::<SocketAddr>() {
            Ok(addr) => {
                match PrometheusBuilder::new().with_http_listener(addr).install() {
                    Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
                    Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
                }
                return;
            }
            Err(e) => warn!("Invalid {} '{}': {}", ENV_METRICS_ADDR, addr_str, e),
        }
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Prometheus text for everything recorded so far, when a local recorder is installed
pub fn render_metrics() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

pub mod cleaning {
    use super::MetricName;

    pub fn run_started() {
        ::metrics::counter!(MetricName::RunsTotal.as_str()).increment(1);
    }

    pub fn run_duration(secs: f64) {
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(secs);
    }

    pub fn chunk_processed() {
        ::metrics::counter!(MetricName::ChunksProcessed.as_str()).increment(1);
    }

    pub fn chunk_failed() {
        ::metrics::counter!(MetricName::ChunksFailed.as_str()).increment(1);
    }

    pub fn rows_read(count: usize) {
        ::metrics::counter!(MetricName::RowsRead.as_str()).increment(count as u64);
    }

    pub fn rows_clean(count: usize) {
        ::metrics::counter!(MetricName::RowsClean.as_str()).increment(count as u64);
    }

    pub fn rows_garbage(count: usize) {
        ::metrics::counter!(MetricName::RowsGarbage.as_str()).increment(count as u64);
    }

    /// `reason` is `missing_email` or `invalid_email`
    pub fn rows_dropped(reason: &'static str, count: usize) {
        ::metrics::counter!(MetricName::RowsDropped.as_str(), "reason" => reason).increment(count as u64);
    }

    pub fn rows_empty(count: usize) {
        ::metrics::counter!(MetricName::RowsEmpty.as_str()).increment(count as u64);
    }

    pub fn rows_duplicated(count: usize) {
        ::metrics::counter!(MetricName::RowsDuplicated.as_str()).increment(count as u64);
    }
}

pub mod split {
    use super::MetricName;

    pub fn file_written(rows: u64) {
        ::metrics::counter!(MetricName::SplitFilesWritten.as_str()).increment(1);
        ::metrics::counter!(MetricName::SplitRowsWritten.as_str()).increment(rows);
    }
}
