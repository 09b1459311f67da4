//! Utility modules for blkstat.

mod duration;

pub use duration::{DurationParseError, parse_duration_nanos, parse_positive_duration};
