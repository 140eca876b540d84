//! Row key layout and scan-range construction
//!
//! Rows are keyed `uid ‖ u32-BE(base hour) [‖ tag bytes]`. Because the
//! timestamp is fixed-width and big-endian, keys for a single metric sort in
//! time order and an hour window maps onto one contiguous key range.

use crate::metadata::MetricUid;
use crate::{Error, Result};

use std::fmt;

/// Seconds per row bucket
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Width of the encoded base-hour timestamp
pub const TIMESTAMP_BYTES: usize = 4;

/// Truncate an epoch to the start of its hour bucket.
pub fn base_hour(epoch: i64) -> i64 {
    epoch - (epoch % SECONDS_PER_HOUR)
}

/// Encode a base hour as the store does: a truncating cast to `u32`,
/// big-endian. Epochs past `u32::MAX` wrap.
pub fn encode_base_hour(base: i64) -> [u8; TIMESTAMP_BYTES] {
    (base as u32).to_be_bytes()
}

/// Build a row key for `uid` at `base`, optionally followed by tag bytes.
pub fn row_key(uid: &MetricUid, base: i64, tags: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(uid.width() + TIMESTAMP_BYTES + tags.len());
    key.extend_from_slice(uid.as_bytes());
    key.extend_from_slice(&encode_base_hour(base));
    key.extend_from_slice(tags);
    key
}

/// Read the base-hour timestamp that follows a `uid_width`-byte UID.
pub fn decode_base_hour(key: &[u8], uid_width: usize) -> Result<u32> {
    let needed = uid_width + TIMESTAMP_BYTES;
    let bytes = key
        .get(uid_width..needed)
        .ok_or(Error::MalformedRowKey {
            len: key.len(),
            needed,
        })?;
    let mut ts = [0u8; TIMESTAMP_BYTES];
    ts.copy_from_slice(bytes);
    Ok(u32::from_be_bytes(ts))
}

/// Requested purge window, inclusive, in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start < 0 || end < 0 {
            return Err(Error::Usage(format!(
                "timestamps must be non-negative epoch seconds, got start={} end={}",
                start, end
            )));
        }
        if start > end {
            return Err(Error::Usage(format!(
                "start ({}) must not be after end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// First hour bucket touched by the window.
    pub fn start_base(&self) -> i64 {
        base_hour(self.start)
    }

    /// Exclusive upper bucket: one full hour past the bucket holding `end`.
    pub fn end_base(&self) -> i64 {
        base_hour(self.end.saturating_add(SECONDS_PER_HOUR))
    }
}

/// Half-open key range `[start_key, end_key)` for one metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
    pub start_base: i64,
    pub end_base: i64,
}

impl ScanRange {
    /// Number of hour buckets covered.
    pub fn hours(&self) -> i64 {
        (self.end_base - self.start_base) / SECONDS_PER_HOUR
    }
}

impl fmt::Display for ScanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            hex::encode(&self.start_key),
            hex::encode(&self.end_key)
        )
    }
}

/// Compute the scan bounds covering every bucket of `window` for `uid`.
pub fn build_range(uid: &MetricUid, window: &TimeWindow) -> ScanRange {
    let start_base = window.start_base();
    let end_base = window.end_base();
    ScanRange {
        start_key: row_key(uid, start_base, &[]),
        end_key: row_key(uid, end_base, &[]),
        start_base,
        end_base,
    }
}
