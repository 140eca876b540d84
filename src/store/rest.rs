//! HBase REST gateway client
//!
//! Talks JSON to the HBase REST server (`hbase rest start`). Row keys, column
//! names and values travel base64-encoded in bodies and percent-encoded in
//! URL paths. Scans use the gateway's stateful scanner resource and page
//! through it until the server answers `204 No Content`.

use super::{Cell, Row, RowScanner, StoreClient};
use crate::config::StoreConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

const JSON: &str = "application/json";

/// Everything outside the RFC 3986 unreserved set
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// HBase REST store client
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    scan_batch: u32,
}

#[derive(Debug, Deserialize)]
struct CellSetModel {
    #[serde(rename = "Row", default)]
    rows: Vec<RowModel>,
}

#[derive(Debug, Deserialize)]
struct RowModel {
    key: String,
    #[serde(rename = "Cell", default)]
    cells: Vec<CellModel>,
}

#[derive(Debug, Deserialize)]
struct CellModel {
    column: String,
    #[serde(rename = "$", default)]
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScannerModel {
    start_row: String,
    end_row: String,
    batch: u32,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            scan_batch: config.scan_batch,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn row_url(&self, table: &str, row: &[u8]) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            encode_path_segment(table.as_bytes()),
            encode_path_segment(row)
        )
    }
}

pub(crate) fn encode_path_segment(raw: &[u8]) -> String {
    percent_encode(raw, PATH_SEGMENT).to_string()
}

fn decode_cell_set(body: &[u8]) -> Result<Vec<Row>> {
    let cell_set: CellSetModel = serde_json::from_slice(body)?;
    let mut rows = Vec::with_capacity(cell_set.rows.len());
    for row in cell_set.rows {
        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in row.cells {
            let column = STANDARD.decode(&cell.column)?;
            let (family, qualifier) = match column.iter().position(|&b| b == b':') {
                Some(idx) => (column[..idx].to_vec(), column[idx + 1..].to_vec()),
                None => (column, Vec::new()),
            };
            cells.push(Cell::new(family, qualifier, STANDARD.decode(&cell.value)?));
        }
        rows.push(Row {
            key: Bytes::from(STANDARD.decode(&row.key)?),
            cells,
        });
    }
    Ok(rows)
}

fn unexpected(op: &str, status: StatusCode) -> Error {
    Error::Transport(format!("{} returned unexpected status {}", op, status))
}

/// Cursor over a gateway scanner resource
///
/// With a cell batch limit the gateway may split one row over two pages, so
/// the last row of each page is held back until the next page shows whether
/// it continues.
struct RestScanner {
    http: reqwest::Client,
    location: String,
    buffer: VecDeque<Row>,
    exhausted: bool,
    released: bool,
}

impl RestScanner {
    async fn fetch_page(&mut self) -> Result<()> {
        let response = self
            .http
            .get(&self.location)
            .header(ACCEPT, JSON)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let rows = decode_cell_set(&body)?;
                trace!(rows = rows.len(), "Fetched scanner page");
                if rows.is_empty() {
                    return self.finish().await;
                }
                for row in rows {
                    match self.buffer.back_mut() {
                        Some(last) if last.key == row.key => last.cells.extend(row.cells),
                        _ => self.buffer.push_back(row),
                    }
                }
                Ok(())
            }
            StatusCode::NO_CONTENT => self.finish().await,
            status => Err(unexpected("scanner next", status)),
        }
    }

    async fn finish(&mut self) -> Result<()> {
        self.exhausted = true;
        self.release().await;
        Ok(())
    }

    /// Drop the gateway-side scanner. Scanners also expire on their own, so
    /// a failed release is only logged.
    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.http.delete(&self.location).send().await {
            Ok(response) if response.status().is_success() => {
                trace!(location = %self.location, "Released scanner");
            }
            Ok(response) => debug!(
                status = %response.status(),
                location = %self.location,
                "Scanner release refused"
            ),
            Err(e) => debug!(error = %e, location = %self.location, "Failed to release scanner"),
        }
    }
}

#[async_trait]
impl RowScanner for RestScanner {
    async fn next(&mut self) -> Result<Option<Row>> {
        loop {
            if self.buffer.len() > 1 || (self.exhausted && !self.buffer.is_empty()) {
                return Ok(self.buffer.pop_front());
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.exhausted = true;
        self.buffer.clear();
        self.release().await;
        Ok(())
    }
}

#[async_trait]
impl StoreClient for RestStore {
    async fn point_lookup(
        &self,
        table: &str,
        row: &[u8],
        family: &str,
        qualifier: &str,
    ) -> Result<Option<Bytes>> {
        let url = format!(
            "{}/{}:{}",
            self.row_url(table, row),
            encode_path_segment(family.as_bytes()),
            encode_path_segment(qualifier.as_bytes())
        );
        let response = self.http.get(&url).header(ACCEPT, JSON).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::OK => {
                let body = response.bytes().await?;
                let value = decode_cell_set(&body)?
                    .into_iter()
                    .flat_map(|r| r.cells)
                    .find(|c| c.is_column(family, qualifier))
                    .map(|c| c.value);
                Ok(value)
            }
            status => Err(unexpected("get", status)),
        }
    }

    async fn scan(&self, table: &str, start: &[u8], end: &[u8]) -> Result<Box<dyn RowScanner>> {
        let url = format!("{}/{}/scanner", self.base_url, encode_path_segment(table.as_bytes()));
        let model = ScannerModel {
            start_row: STANDARD.encode(start),
            end_row: STANDARD.encode(end),
            batch: self.scan_batch,
        };
        let response = self.http.put(&url).json(&model).send().await?;

        if response.status() != StatusCode::CREATED {
            return Err(unexpected("scanner create", response.status()));
        }
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Transport("scanner create returned no Location".to_string()))?
            .to_string();

        debug!(
            table,
            start = %hex::encode(start),
            end = %hex::encode(end),
            location = %location,
            "Opened scanner"
        );

        Ok(Box::new(RestScanner {
            http: self.http.clone(),
            location,
            buffer: VecDeque::new(),
            exhausted: false,
            released: false,
        }))
    }

    async fn delete(&self, table: &str, row: &[u8]) -> Result<()> {
        let response = self.http.delete(self.row_url(table, row)).send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(unexpected("delete", status)),
        }
    }
}
