//! Statistics for collection runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::chunk::WriteReport;
use crate::upload::UploadReport;

/// Statistics collected during a collection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Records yielded by the sources
    pub records_fetched: usize,

    /// Artifacts finalized on disk
    pub artifacts_written: usize,

    /// Chunks that failed to persist
    pub chunks_skipped: usize,

    /// Artifacts uploaded
    pub uploads_succeeded: usize,

    /// Artifacts that failed to upload
    pub uploads_failed: usize,

    /// Skips and fallbacks encountered during the run
    pub errors: Vec<String>,
}

impl CollectionStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the run as complete with the current time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Record the outcome of writing one grouping key.
    pub fn record_write(&mut self, report: &WriteReport) {
        self.records_fetched += report.records_seen();
        self.artifacts_written += report.artifacts.len();
        self.chunks_skipped += report.skipped.len();
        for skipped in &report.skipped {
            self.errors.push(format!("File is skipped: {}, due to: {}", skipped.name, skipped.reason));
        }
    }

    /// Record the outcome of an upload batch.
    pub fn record_upload(&mut self, report: &UploadReport) {
        self.uploads_succeeded += report.succeeded();
        self.uploads_failed += report.failed();
        for failure in report.failures() {
            if let Err(e) = &failure.result {
                self.errors.push(format!("Upload of {} failed: {}", failure.path.display(), e));
            }
        }
    }

    /// Record an error.
    pub fn record_error(&mut self, error: impl ToString) {
        self.errors.push(error.to_string());
    }

    /// Get the duration of the run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Calculate the throughput in records per second.
    pub fn records_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if secs > 0.0 {
                self.records_fetched as f64 / secs
            } else {
                0.0
            }
        })
    }
}
