//! Row key schema for the HBase time-series layout
//!
//! Data rows are bucketed by hour under a key that starts with the metric's
//! fixed-width UID. Everything after the base-hour timestamp is tag data that
//! this crate treats as opaque.

mod row_key;

pub use row_key::{
    base_hour,
    build_range,
    decode_base_hour,
    encode_base_hour,
    row_key,
    ScanRange,
    TimeWindow,
    SECONDS_PER_HOUR,
    TIMESTAMP_BYTES,
};
