//! Local in-memory store for development and testing

use super::{Cell, Row, RowScanner, StoreClient};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Table = BTreeMap<Vec<u8>, Vec<Cell>>;

/// Default number of rows a scanner pulls per page
const DEFAULT_PAGE_SIZE: usize = 128;

/// Local in-memory store
///
/// Tables are `BTreeMap`s keyed by raw row bytes, so scans come back in the
/// same lexicographic order an HBase region server would return them.
/// Clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    stats: Arc<StoreStats>,
    page_size: usize,
}

/// Operation counters
#[derive(Debug, Default)]
pub struct StoreStats {
    lookups: AtomicU64,
    scans: AtomicU64,
    deletes: AtomicU64,
}

impl StoreStats {
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store whose scanners fetch `page_size` rows at a time
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(StoreStats::default()),
            page_size: page_size.max(1),
        }
    }

    /// Write a cell, replacing any existing cell at the same column.
    pub fn put(&self, table: &str, row: &[u8], family: &str, qualifier: &str, value: &[u8]) {
        let mut tables = self.tables.write();
        let cells = tables
            .entry(table.to_string())
            .or_default()
            .entry(row.to_vec())
            .or_default();
        cells.retain(|c| !c.is_column(family, qualifier));
        cells.push(Cell::new(
            Bytes::copy_from_slice(family.as_bytes()),
            Bytes::copy_from_slice(qualifier.as_bytes()),
            Bytes::copy_from_slice(value),
        ));
    }

    pub fn contains_row(&self, table: &str, row: &[u8]) -> bool {
        self.tables
            .read()
            .get(table)
            .is_some_and(|t| t.contains_key(row))
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.len())
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    fn page(&self, table: &str, lower: &Bound<Vec<u8>>, end: &[u8]) -> Vec<Row> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else {
            return Vec::new();
        };

        let empty = match lower {
            Bound::Included(start) => start.as_slice() >= end,
            Bound::Excluded(start) => start.as_slice() >= end,
            Bound::Unbounded => false,
        };
        if empty {
            return Vec::new();
        }

        rows.range::<Vec<u8>, _>((lower.clone(), Bound::Excluded(end.to_vec())))
            .take(self.page_size)
            .map(|(key, cells)| Row {
                key: Bytes::copy_from_slice(key),
                cells: cells.clone(),
            })
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Paging cursor over a [`MemoryStore`] table
///
/// Each page re-seeks past the last returned key, so rows deleted between
/// pages are simply not seen again.
struct MemoryScanner {
    store: MemoryStore,
    table: String,
    lower: Bound<Vec<u8>>,
    end: Vec<u8>,
    buffer: VecDeque<Row>,
    exhausted: bool,
}

#[async_trait]
impl RowScanner for MemoryScanner {
    async fn next(&mut self) -> Result<Option<Row>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self.store.page(&self.table, &self.lower, &self.end);
            match page.last() {
                Some(last) => self.lower = Bound::Excluded(last.key.to_vec()),
                None => self.exhausted = true,
            }
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn point_lookup(
        &self,
        table: &str,
        row: &[u8],
        family: &str,
        qualifier: &str,
    ) -> Result<Option<Bytes>> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .and_then(|t| t.get(row))
            .and_then(|cells| cells.iter().find(|c| c.is_column(family, qualifier)))
            .map(|c| c.value.clone()))
    }

    async fn scan(&self, table: &str, start: &[u8], end: &[u8]) -> Result<Box<dyn RowScanner>> {
        self.stats.scans.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MemoryScanner {
            store: self.clone(),
            table: table.to_string(),
            lower: Bound::Included(start.to_vec()),
            end: end.to_vec(),
            buffer: VecDeque::new(),
            exhausted: false,
        }))
    }

    async fn delete(&self, table: &str, row: &[u8]) -> Result<()> {
        self.stats.deletes.fetch_add(1, Ordering::Relaxed);
        if let Some(t) = self.tables.write().get_mut(table) {
            t.remove(row);
        }
        Ok(())
    }
}
