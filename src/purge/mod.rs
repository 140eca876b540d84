//! Scan-and-delete purge pipeline
//!
//! The purger walks the rows of one metric inside a [`ScanRange`] in key
//! order and deletes each one. It stops at the first failure and reports how
//! far it got:
//! - Dry runs do every read-side step and count rows without deleting
//! - One delete per row removes all of that row's cells
//! - Deleting an already absent row is a no-op, so reruns are safe

mod progress;

pub use progress::{LogReporter, NoopReporter, ProgressReporter, PurgeProgress, RecordingReporter};

use crate::config::SchemaConfig;
use crate::metadata::ResolvedMetric;
use crate::schema::{decode_base_hour, ScanRange};
use crate::store::{RowScanner, StoreClient};
use crate::{Error, Result};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Whether matched rows are deleted or only counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeMode {
    DryRun,
    Destructive,
}

impl PurgeMode {
    pub fn from_noop(noop: bool) -> Self {
        if noop {
            PurgeMode::DryRun
        } else {
            PurgeMode::Destructive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PurgeMode::DryRun => "dry-run",
            PurgeMode::Destructive => "destructive",
        }
    }
}

/// Terminal state of a purge
#[derive(Debug)]
pub enum PurgeStatus {
    Completed,
    AbortedByUser,
    Failed(Error),
}

impl PurgeStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, PurgeStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PurgeStatus::Failed(_))
    }
}

/// Result of purging one metric
#[derive(Debug)]
pub struct PurgeOutcome {
    pub metric: String,
    pub mode: PurgeMode,
    /// Rows fully processed (deleted, or counted in a dry run)
    pub rows: u64,
    /// Cells carried by the processed rows
    pub cells: u64,
    /// Delete calls that succeeded
    pub deleted: u64,
    /// Base hour of the last processed row
    pub last_base_hour: Option<u32>,
    pub status: PurgeStatus,
}

impl PurgeOutcome {
    fn new(metric: &str, mode: PurgeMode) -> Self {
        Self {
            metric: metric.to_string(),
            mode,
            rows: 0,
            cells: 0,
            deleted: 0,
            last_base_hour: None,
            status: PurgeStatus::Completed,
        }
    }

    /// Outcome for a metric the operator chose not to purge
    pub fn aborted_by_user(metric: &str, mode: PurgeMode) -> Self {
        Self {
            status: PurgeStatus::AbortedByUser,
            ..Self::new(metric, mode)
        }
    }

    fn fail(mut self, err: Error) -> Self {
        self.status = PurgeStatus::Failed(err);
        self
    }

    pub fn progress(&self) -> PurgeProgress {
        PurgeProgress {
            rows: self.rows,
            cells: self.cells,
            last_base_hour: self.last_base_hour,
        }
    }

    /// Turn a failed or declined outcome into an error
    pub fn into_result(self) -> Result<PurgeOutcome> {
        match self.status {
            PurgeStatus::Completed => Ok(self),
            PurgeStatus::AbortedByUser => Err(Error::UserAborted),
            PurgeStatus::Failed(source) => Err(Error::PurgeAborted {
                metric: self.metric,
                processed: self.rows,
                source: Box::new(source),
            }),
        }
    }
}

impl fmt::Display for PurgeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.mode {
            PurgeMode::DryRun => "would delete",
            PurgeMode::Destructive => "deleted",
        };
        let count = match self.mode {
            PurgeMode::DryRun => self.rows,
            PurgeMode::Destructive => self.deleted,
        };
        write!(f, "{}: {} {} rows ({} cells)", self.metric, verb, count, self.cells)?;
        match &self.status {
            PurgeStatus::Completed => Ok(()),
            PurgeStatus::AbortedByUser => write!(f, ", declined"),
            PurgeStatus::Failed(e) => write!(f, ", failed: {}", e),
        }
    }
}

/// Drives the scan-delete loop against the data table
pub struct Purger {
    store: Arc<dyn StoreClient>,
    schema: SchemaConfig,
}

impl Purger {
    pub fn new(store: Arc<dyn StoreClient>, schema: SchemaConfig) -> Self {
        Self { store, schema }
    }

    /// Purge every row of `metric` inside `range`.
    ///
    /// Never returns early with an error: failures end the walk and are
    /// recorded in the outcome status alongside the rows processed so far.
    pub async fn purge(
        &self,
        metric: &ResolvedMetric,
        range: &ScanRange,
        mode: PurgeMode,
        reporter: &dyn ProgressReporter,
    ) -> PurgeOutcome {
        let mut outcome = PurgeOutcome::new(&metric.name, mode);
        let uid_width = metric.uid.width();
        let table = &self.schema.data_table;

        info!(
            metric = %metric.name,
            mode = mode.as_str(),
            start_base = range.start_base,
            end_base = range.end_base,
            range = %range,
            "Starting purge"
        );

        let mut scanner = match self
            .store
            .scan(table, &range.start_key, &range.end_key)
            .await
        {
            Ok(scanner) => scanner,
            Err(e) => {
                error!(metric = %metric.name, error = %e, "Failed to open scan");
                return outcome.fail(e);
            }
        };

        loop {
            let row = match scanner.next().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    error!(metric = %metric.name, rows = outcome.rows, error = %e, "Scan failed");
                    return abort(scanner.as_mut(), outcome, e).await;
                }
            };

            let base_hour = match decode_base_hour(&row.key, uid_width) {
                Ok(ts) => ts,
                Err(e) => {
                    warn!(metric = %metric.name, key = %hex::encode(&row.key), "Undecodable row key");
                    return abort(scanner.as_mut(), outcome, e).await;
                }
            };
            trace!(key = %hex::encode(&row.key), cells = row.cells.len(), "Matched row");

            if mode == PurgeMode::Destructive {
                if let Err(e) = self.store.delete(table, &row.key).await {
                    error!(
                        metric = %metric.name,
                        deleted = outcome.deleted,
                        key = %hex::encode(&row.key),
                        error = %e,
                        "Delete failed, aborting purge"
                    );
                    return abort(scanner.as_mut(), outcome, e).await;
                }
                outcome.deleted += 1;
            }

            outcome.rows += 1;
            outcome.cells += row.cells.len() as u64;
            outcome.last_base_hour = Some(base_hour);
            reporter.report(&metric.name, &outcome.progress());
        }

        info!(
            metric = %metric.name,
            mode = mode.as_str(),
            rows = outcome.rows,
            cells = outcome.cells,
            deleted = outcome.deleted,
            "Purge completed"
        );
        outcome
    }
}

/// End a purge early, releasing the scanner before recording the failure.
async fn abort(
    scanner: &mut dyn RowScanner,
    outcome: PurgeOutcome,
    err: Error,
) -> PurgeOutcome {
    if let Err(e) = scanner.close().await {
        debug!(metric = %outcome.metric, error = %e, "Failed to close scanner");
    }
    outcome.fail(err)
}
