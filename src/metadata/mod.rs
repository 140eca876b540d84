//! UID catalog access
//!
//! Metric names are stored as fixed-width UIDs in data row keys. This module
//! maps names to those UIDs through the store's UID table and keeps the
//! answers for the lifetime of the resolver.

mod uid;

pub use uid::{MetricResolver, MetricUid, ResolvedMetric, UidCache};
