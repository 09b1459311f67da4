//! Per-device rate snapshot, as served over HTTP.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latest computed rates for one device.
///
/// Rates are normalized to one second of the configured sampling interval.
/// Replaced as a whole on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub struct DeviceSnapshot {
    /// Wall-clock time the rates were computed (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Read I/Os completed per second.
    pub reads_per_second: i64,
    /// Bytes read per second.
    pub bytes_read_per_second: i64,
    /// Read wait time accrued per second (ms).
    pub read_wait_milliseconds: i64,
    /// Write I/Os completed per second.
    pub writes_per_second: i64,
    /// Bytes written per second.
    pub bytes_written_per_second: i64,
    /// Write wait time accrued per second (ms).
    pub write_wait_milliseconds: i64,
    /// I/Os in flight at sample time.
    pub in_flight: u64,
    /// Weighted queue time accrued per second (ms).
    pub queue_wait_milliseconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_json_field_names() {
        let snap = DeviceSnapshot {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            reads_per_second: 10,
            bytes_read_per_second: 102400,
            read_wait_milliseconds: 5,
            writes_per_second: 4,
            bytes_written_per_second: 40960,
            write_wait_milliseconds: 2,
            in_flight: 5,
            queue_wait_milliseconds: 9,
        };
        let json = serde_json::to_value(snap).unwrap();

        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(json["reads-per-second"], 10);
        assert_eq!(json["bytes-read-per-second"], 102400);
        assert_eq!(json["read-wait-milliseconds"], 5);
        assert_eq!(json["writes-per-second"], 4);
        assert_eq!(json["bytes-written-per-second"], 40960);
        assert_eq!(json["write-wait-milliseconds"], 2);
        assert_eq!(json["in-flight"], 5);
        assert_eq!(json["queue-wait-milliseconds"], 9);
        assert_eq!(json.as_object().unwrap().len(), 9);
    }
}
