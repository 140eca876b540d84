//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use tspurge::metadata::MetricUid;
use tspurge::schema::row_key;
use tspurge::store::{MemoryStore, Row, RowScanner, StoreClient};
use tspurge::{Error, Result};

pub const HOUR: i64 = 3600;
pub const BASE: i64 = 1_497_387_600;
pub const DATA_TABLE: &str = "tsdb";
pub const UID_TABLE: &str = "tsdb-uid";

pub fn uid(last: u8) -> MetricUid {
    MetricUid::new(vec![0, 0, last])
}

/// Register `name` in the UID table
pub fn register_metric(store: &MemoryStore, name: &str, uid: &MetricUid) {
    store.put(UID_TABLE, name.as_bytes(), "id", "metrics", uid.as_bytes());
}

/// One row per hour starting at `BASE`, each with a single tag cell
pub fn seed_hours(store: &MemoryStore, uid: &MetricUid, hours: i64) {
    for h in 0..hours {
        let key = row_key(uid, BASE + h * HOUR, &[0, 0, 1, 0, 0, 1]);
        store.put(DATA_TABLE, &key, "t", "q", &(h as u32).to_be_bytes());
    }
}

/// Store wrapper that injects failures into a [`MemoryStore`]
pub struct FaultyStore {
    pub inner: MemoryStore,
    /// 1-based delete call that fails
    pub fail_delete_on: Option<u64>,
    /// Rows the scanner yields before failing
    pub fail_scan_after: Option<u64>,
    pub fail_lookup: bool,
    delete_calls: AtomicU64,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_delete_on: None,
            fail_scan_after: None,
            fail_lookup: false,
            delete_calls: AtomicU64::new(0),
        }
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

struct FaultyScanner {
    inner: Box<dyn RowScanner>,
    remaining: u64,
}

#[async_trait]
impl RowScanner for FaultyScanner {
    async fn next(&mut self) -> Result<Option<Row>> {
        if self.remaining == 0 {
            return Err(Error::Transport("scanner lease expired".to_string()));
        }
        self.remaining -= 1;
        self.inner.next().await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}

#[async_trait]
impl StoreClient for FaultyStore {
    async fn point_lookup(
        &self,
        table: &str,
        row: &[u8],
        family: &str,
        qualifier: &str,
    ) -> Result<Option<Bytes>> {
        if self.fail_lookup {
            return Err(Error::Transport("connection refused".to_string()));
        }
        self.inner.point_lookup(table, row, family, qualifier).await
    }

    async fn scan(&self, table: &str, start: &[u8], end: &[u8]) -> Result<Box<dyn RowScanner>> {
        let inner = self.inner.scan(table, start, end).await?;
        Ok(match self.fail_scan_after {
            Some(remaining) => Box::new(FaultyScanner { inner, remaining }),
            None => inner,
        })
    }

    async fn delete(&self, table: &str, row: &[u8]) -> Result<()> {
        let call = self.delete_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_delete_on == Some(call) {
            return Err(Error::Transport("region server unavailable".to_string()));
        }
        self.inner.delete(table, row).await
    }
}
