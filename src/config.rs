//! Configuration and component factory
//!
//! Schema facts of the target store (table names, UID width) default to the
//! stock OpenTSDB layout and can be overridden from the environment. The
//! factory turns a [`StoreConfig`] into a concrete [`StoreClient`].

use crate::store::{MemoryStore, RestStore, StoreClient};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Host value that selects the in-memory store
pub const MEMORY_HOST: &str = "memory";

/// Fixed schema facts of the time-series tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Table holding data points
    pub data_table: String,
    /// Table mapping names to UIDs
    pub uid_table: String,
    /// Column family of the name → UID direction
    pub uid_family: String,
    /// Qualifier for metric UIDs
    pub metrics_qualifier: String,
    /// Width in bytes of a metric UID
    pub metric_width: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            data_table: "tsdb".to_string(),
            uid_table: "tsdb-uid".to_string(),
            uid_family: "id".to_string(),
            metrics_qualifier: "metrics".to_string(),
            metric_width: 3,
        }
    }
}

impl SchemaConfig {
    /// Load schema overrides from environment
    ///
    /// Environment variables:
    /// - TSDB_TABLE: data table (default: tsdb)
    /// - TSDB_UID_TABLE: UID table (default: tsdb-uid)
    /// - TSDB_METRICS_WIDTH: metric UID width in bytes (default: 3)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(table) = non_empty_env("TSDB_TABLE") {
            config.data_table = table;
        }
        if let Some(table) = non_empty_env("TSDB_UID_TABLE") {
            config.uid_table = table;
        }
        if let Some(raw) = non_empty_env("TSDB_METRICS_WIDTH") {
            config.metric_width = parse_width(&raw)?;
        }

        Ok(config)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_width(raw: &str) -> Result<usize> {
    let width = raw.trim().parse::<usize>().map_err(|e| {
        Error::Config(format!("TSDB_METRICS_WIDTH must be an integer: {e}"))
    })?;
    if !(1..=8).contains(&width) {
        return Err(Error::Config(format!(
            "TSDB_METRICS_WIDTH must be between 1 and 8, got {width}"
        )));
    }
    Ok(width)
}

/// Connection settings for the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// REST gateway host, a full `http(s)://` URL, or `memory`
    pub host: String,
    /// REST gateway port
    pub port: u16,
    /// Use https when `host` carries no scheme
    pub tls: bool,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Cells per scanner page
    pub scan_batch: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            tls: false,
            request_timeout: Duration::from_secs(30),
            scan_batch: 1000,
        }
    }
}

impl StoreConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.host.trim().eq_ignore_ascii_case(MEMORY_HOST)
    }

    /// Gateway base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            return host.to_string();
        }
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, host, self.port)
    }
}

pub struct ComponentFactory;

impl ComponentFactory {
    /// Create the store client for `config`
    pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn StoreClient>> {
        if config.host.trim().is_empty() {
            return Err(Error::Usage(
                "you must specify the HBase host, e.g. --host hbasehost.local".to_string(),
            ));
        }

        if config.is_memory() {
            info!("Using in-memory store (development mode)");
            return Ok(Arc::new(MemoryStore::new()));
        }

        let store = RestStore::new(config)?;
        info!(base_url = %store.base_url(), "Using HBase REST store");
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_host_and_port() {
        let config = StoreConfig::new("hbase.local");
        assert_eq!(config.base_url(), "http://hbase.local:8080");

        let tls = StoreConfig {
            tls: true,
            port: 8443,
            ..StoreConfig::new("hbase.local")
        };
        assert_eq!(tls.base_url(), "https://hbase.local:8443");
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        let config = StoreConfig::new("https://gateway.example.com/hbase/");
        assert_eq!(config.base_url(), "https://gateway.example.com/hbase");
    }

    #[test]
    fn test_parse_width_bounds() {
        assert_eq!(parse_width("3").unwrap(), 3);
        assert!(matches!(parse_width("0"), Err(Error::Config(_))));
        assert!(matches!(parse_width("abc"), Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_rejects_empty_host() {
        let err = ComponentFactory::create_store(&StoreConfig::new("  ")).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_factory_memory_host() {
        assert!(StoreConfig::new("Memory").is_memory());
        assert!(ComponentFactory::create_store(&StoreConfig::new("memory")).is_ok());
    }
}
