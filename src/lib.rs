//! # tspurge
//!
//! Deletes the data points of named metrics inside a time window from an
//! HBase-backed time-series store (the OpenTSDB `tsdb` / `tsdb-uid` layout).
//!
//! ## Architecture
//!
//! - **Metadata**: resolves metric names to fixed-width UIDs, cached per resolver
//! - **Schema**: hour-bucketed row keys and the scan range covering a window
//! - **Purge**: ordered scan + per-row delete with dry-run and fail-fast semantics
//! - **Confirm**: operator gate in front of destructive runs
//! - **Store**: the point lookup / range scan / delete contract and its backends

pub mod config;
pub mod confirm;
pub mod metadata;
pub mod purge;
pub mod schema;
pub mod session;
pub mod store;
pub mod telemetry;

mod error;

pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::{ComponentFactory, SchemaConfig, StoreConfig};
    pub use crate::confirm::{AssumeYes, Confirm, ConfirmationGate, PurgeSummary};
    pub use crate::metadata::{MetricResolver, MetricUid, ResolvedMetric};
    pub use crate::purge::{PurgeMode, PurgeOutcome, PurgeStatus, Purger};
    pub use crate::schema::{build_range, ScanRange, TimeWindow};
    pub use crate::session::{PurgeRequest, PurgeSession};
    pub use crate::store::{MemoryStore, RestStore, StoreClient};
    pub use crate::{Error, Result};
}
