//! Metric name → UID resolution

use crate::config::SchemaConfig;
use crate::store::StoreClient;
use crate::{Error, Result};
use bytes::Bytes;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Fixed-width binary identifier assigned to a metric name
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MetricUid(Bytes);

impl MetricUid {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for MetricUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetricUid({})", hex::encode(&self.0))
    }
}

impl fmt::Display for MetricUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// A metric name paired with its UID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetric {
    pub name: String,
    pub uid: MetricUid,
}

/// Name → UID cache
///
/// UIDs never change once assigned, so entries are insert-if-absent and
/// never evicted.
#[derive(Debug, Default)]
pub struct UidCache {
    entries: DashMap<String, MetricUid>,
}

impl UidCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<MetricUid> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    /// Insert unless present; returns the cached value either way.
    pub fn insert(&self, name: &str, uid: MetricUid) -> MetricUid {
        self.entries
            .entry(name.to_string())
            .or_insert(uid)
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves metric names against the UID table
pub struct MetricResolver {
    store: Arc<dyn StoreClient>,
    schema: SchemaConfig,
    cache: Arc<UidCache>,
}

impl MetricResolver {
    pub fn new(store: Arc<dyn StoreClient>, schema: SchemaConfig) -> Self {
        Self::with_cache(store, schema, Arc::new(UidCache::new()))
    }

    /// Build a resolver sharing an existing cache
    pub fn with_cache(
        store: Arc<dyn StoreClient>,
        schema: SchemaConfig,
        cache: Arc<UidCache>,
    ) -> Self {
        Self {
            store,
            schema,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<UidCache> {
        &self.cache
    }

    /// Look up the UID for `name`.
    ///
    /// Store failures are returned unchanged and nothing is cached.
    pub async fn resolve(&self, name: &str) -> Result<MetricUid> {
        if name.trim().is_empty() {
            return Err(Error::Usage("metric name must not be empty".to_string()));
        }

        if let Some(uid) = self.cache.get(name) {
            return Ok(uid);
        }

        let value = self
            .store
            .point_lookup(
                &self.schema.uid_table,
                name.as_bytes(),
                &self.schema.uid_family,
                &self.schema.metrics_qualifier,
            )
            .await?
            .ok_or_else(|| Error::MetricNotFound {
                name: name.to_string(),
            })?;

        if value.len() != self.schema.metric_width {
            return Err(Error::InvalidUid {
                name: name.to_string(),
                expected: self.schema.metric_width,
                actual: value.len(),
            });
        }

        let uid = self.cache.insert(name, MetricUid::new(value));
        debug!(metric = %name, uid = %uid, "Resolved metric UID");
        Ok(uid)
    }

    /// Resolve every name in order, stopping at the first failure.
    pub async fn resolve_all(&self, names: &[String]) -> Result<Vec<ResolvedMetric>> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let uid = self.resolve(name).await?;
            resolved.push(ResolvedMetric {
                name: name.clone(),
                uid,
            });
        }
        Ok(resolved)
    }
}
