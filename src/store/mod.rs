//! Store client abstraction
//!
//! The purge pipeline only needs three operations from the underlying
//! key-value store: a point lookup, an ordered range scan, and a row delete.
//! Backends implement [`StoreClient`]; scans are exposed as a pull-based
//! [`RowScanner`] so callers stay in control of when the next row is fetched.

mod memory;
mod rest;

pub use memory::{MemoryStore, StoreStats};
pub use rest::RestStore;

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// A single stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub family: Bytes,
    pub qualifier: Bytes,
    pub value: Bytes,
}

impl Cell {
    pub fn new(
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
        }
    }

    /// True when this cell lives at `family:qualifier`.
    pub fn is_column(&self, family: &str, qualifier: &str) -> bool {
        self.family.as_ref() == family.as_bytes() && self.qualifier.as_ref() == qualifier.as_bytes()
    }
}

/// A row returned by a scan, with every cell it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: Bytes,
    pub cells: Vec<Cell>,
}

/// Ordered, finite cursor over scan results.
///
/// Rows come back in ascending key order. `Ok(None)` marks the end of the
/// stream; a cursor is not restartable.
#[async_trait]
pub trait RowScanner: Send {
    async fn next(&mut self) -> Result<Option<Row>>;

    /// Release any server-side state before the end of the stream is
    /// reached. Closing an exhausted or already closed cursor is a no-op.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Store client interface
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch the value at `family:qualifier` in `row`, or `None` if absent.
    async fn point_lookup(
        &self,
        table: &str,
        row: &[u8],
        family: &str,
        qualifier: &str,
    ) -> Result<Option<Bytes>>;

    /// Open a scan over `[start, end)`.
    async fn scan(&self, table: &str, start: &[u8], end: &[u8]) -> Result<Box<dyn RowScanner>>;

    /// Delete a whole row. Deleting an absent row succeeds.
    async fn delete(&self, table: &str, row: &[u8]) -> Result<()>;
}
