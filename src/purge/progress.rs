//! Purge progress reporting

use chrono::DateTime;
use parking_lot::Mutex;
use tracing::{debug, info};

/// Running position of a purge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeProgress {
    /// Rows processed so far
    pub rows: u64,
    /// Cells carried by those rows
    pub cells: u64,
    /// Base hour of the most recent row
    pub last_base_hour: Option<u32>,
}

/// Receives a progress update after every processed row.
///
/// Implementations must not block; reporting is advisory.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, metric: &str, progress: &PurgeProgress);
}

/// Logs every row at debug and every `every` rows at info
#[derive(Debug, Clone)]
pub struct LogReporter {
    every: u64,
}

impl LogReporter {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ProgressReporter for LogReporter {
    fn report(&self, metric: &str, progress: &PurgeProgress) {
        let hour = progress
            .last_base_hour
            .and_then(|ts| DateTime::from_timestamp(ts as i64, 0))
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        if progress.rows % self.every == 0 {
            info!(
                metric = %metric,
                rows = progress.rows,
                cells = progress.cells,
                hour = %hour,
                "Purge progress"
            );
        } else {
            debug!(metric = %metric, rows = progress.rows, hour = %hour, "Processed row");
        }
    }
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _metric: &str, _progress: &PurgeProgress) {}
}

/// Keeps every update, for tests and callers that render their own output
#[derive(Debug, Default)]
pub struct RecordingReporter {
    updates: Mutex<Vec<(String, PurgeProgress)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(String, PurgeProgress)> {
        self.updates.lock().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, metric: &str, progress: &PurgeProgress) {
        self.updates.lock().push((metric.to_string(), *progress));
    }
}
