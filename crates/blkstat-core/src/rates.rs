//! Rate computation from two consecutive block stat readings.
//!
//! Rates are normalized by the *configured* sampling interval, not by the
//! measured time between reads. A late tick inflates that one sample; the
//! next sample is correct again because the baseline moves every tick.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::collector::parser::{BlockStat, FIELD_COUNT};
use crate::storage::model::DeviceSnapshot;

/// Bytes per sector as reported in `/sys/block/<dev>/stat`, independent of
/// the device's physical sector size.
pub const SECTOR_SIZE: i128 = 512;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Signed difference `curr - prev`.
///
/// Counters are not corrected for wraparound or reset; a regression yields a
/// negative delta.
pub fn delta(curr: u64, prev: u64) -> i128 {
    i128::from(curr) - i128::from(prev)
}

/// Per-field deltas in file order.
pub fn deltas(prev: &BlockStat, curr: &BlockStat) -> [i128; FIELD_COUNT] {
    let (p, c) = (prev.fields(), curr.fields());
    std::array::from_fn(|i| delta(c[i], p[i]))
}

/// Scales `delta` accrued over `interval` to one second.
///
/// Truncating integer division in nanosecond resolution; the result saturates
/// at the `i64` bounds. A zero interval yields 0.
pub fn per_second(delta: i128, interval: Duration) -> i64 {
    let nanos = i128::try_from(interval.as_nanos()).unwrap_or(i128::MAX);
    let rate = delta
        .saturating_mul(NANOS_PER_SEC)
        .checked_div(nanos)
        .unwrap_or(0);
    i64::try_from(rate).unwrap_or(if rate < 0 { i64::MIN } else { i64::MAX })
}

/// Computes the snapshot for one interval.
pub fn compute_snapshot(
    prev: &BlockStat,
    curr: &BlockStat,
    interval: Duration,
    timestamp: DateTime<Utc>,
) -> DeviceSnapshot {
    let rate = |c: u64, p: u64| per_second(delta(c, p), interval);
    let byte_rate = |c: u64, p: u64| per_second(delta(c, p) * SECTOR_SIZE, interval);

    DeviceSnapshot {
        timestamp,
        reads_per_second: rate(curr.read_ios, prev.read_ios),
        bytes_read_per_second: byte_rate(curr.read_sectors, prev.read_sectors),
        read_wait_milliseconds: rate(curr.read_ticks, prev.read_ticks),
        writes_per_second: rate(curr.write_ios, prev.write_ios),
        bytes_written_per_second: byte_rate(curr.write_sectors, prev.write_sectors),
        write_wait_milliseconds: rate(curr.write_ticks, prev.write_ticks),
        in_flight: curr.in_flight,
        queue_wait_milliseconds: rate(curr.time_in_queue, prev.time_in_queue),
    }
}
