//! One purge invocation: resolve, plan, confirm, purge

use crate::config::SchemaConfig;
use crate::confirm::{Confirm, PurgeSummary};
use crate::metadata::MetricResolver;
use crate::purge::{ProgressReporter, PurgeMode, PurgeOutcome, PurgeStatus, Purger};
use crate::schema::{build_range, TimeWindow};
use crate::store::StoreClient;
use crate::{Error, Result};

use std::sync::Arc;
use tracing::{info, warn};

/// Operator request
#[derive(Debug, Clone)]
pub struct PurgeRequest {
    pub metrics: Vec<String>,
    pub window: TimeWindow,
    pub mode: PurgeMode,
}

impl PurgeRequest {
    pub fn new(metrics: Vec<String>, start: i64, end: i64, mode: PurgeMode) -> Result<Self> {
        if metrics.is_empty() {
            return Err(Error::Usage(
                "you must specify at least one metric".to_string(),
            ));
        }
        Ok(Self {
            metrics,
            window: TimeWindow::new(start, end)?,
            mode,
        })
    }
}

/// Outcomes of every metric in a request, in request order
#[derive(Debug)]
pub struct SessionReport {
    pub outcomes: Vec<PurgeOutcome>,
}

impl SessionReport {
    pub fn total_rows(&self) -> u64 {
        self.outcomes.iter().map(|o| o.rows).sum()
    }

    pub fn declined(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, PurgeStatus::AbortedByUser))
    }

    /// First failed or declined outcome as an error, otherwise the report
    pub fn into_result(mut self) -> Result<SessionReport> {
        if let Some(idx) = self.outcomes.iter().position(|o| !o.status.is_completed()) {
            self.outcomes.remove(idx).into_result()?;
        }
        Ok(self)
    }
}

/// Wires the resolver, confirmation and purger for one invocation
pub struct PurgeSession {
    resolver: MetricResolver,
    purger: Purger,
}

impl PurgeSession {
    pub fn new(store: Arc<dyn StoreClient>, schema: SchemaConfig) -> Self {
        Self {
            resolver: MetricResolver::new(Arc::clone(&store), schema.clone()),
            purger: Purger::new(store, schema),
        }
    }

    pub fn resolver(&self) -> &MetricResolver {
        &self.resolver
    }

    /// Resolve every metric and compute its scan range.
    pub async fn plan(&self, request: &PurgeRequest) -> Result<PurgeSummary> {
        let metrics = self.resolver.resolve_all(&request.metrics).await?;
        let targets = metrics
            .into_iter()
            .map(|m| {
                let range = build_range(&m.uid, &request.window);
                (m, range)
            })
            .collect();

        Ok(PurgeSummary {
            window: request.window,
            mode: request.mode,
            targets,
        })
    }

    /// Run the request.
    ///
    /// Resolution errors and gate I/O errors are returned before any scan.
    /// A decline yields `AbortedByUser` outcomes and touches nothing. Purges
    /// run in request order and stop at the first failed metric.
    pub async fn run(
        &self,
        request: &PurgeRequest,
        gate: &mut dyn Confirm,
        reporter: &dyn ProgressReporter,
    ) -> Result<SessionReport> {
        let summary = self.plan(request).await?;

        if request.mode == PurgeMode::Destructive && !gate.confirm(&summary)? {
            warn!(metrics = ?request.metrics, "Purge declined by operator");
            let outcomes = summary
                .targets
                .iter()
                .map(|(m, _)| PurgeOutcome::aborted_by_user(&m.name, request.mode))
                .collect();
            return Ok(SessionReport { outcomes });
        }

        let mut outcomes = Vec::with_capacity(summary.targets.len());
        for (metric, range) in &summary.targets {
            let outcome = self
                .purger
                .purge(metric, range, request.mode, reporter)
                .await;
            let failed = outcome.status.is_failed();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }

        info!(
            metrics = outcomes.len(),
            rows = outcomes.iter().map(|o| o.rows).sum::<u64>(),
            mode = request.mode.as_str(),
            "Purge session finished"
        );
        Ok(SessionReport { outcomes })
    }
}
